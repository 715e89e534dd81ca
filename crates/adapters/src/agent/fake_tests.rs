// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

fn config(agent_id: &str) -> AgentSpawnConfig {
    AgentSpawnConfig {
        agent_id: AgentId::new(agent_id),
        command: "claude".to_string(),
        args: vec![],
        env: vec![],
        workspace_path: PathBuf::from("/workspace"),
        cwd: None,
        project_root: PathBuf::from("/project"),
        prompt: "Test prompt".to_string(),
    }
}

#[tokio::test]
async fn spawn_and_kill() {
    let adapter = FakeAgentAdapter::new();

    let handle = adapter.spawn(config("test-agent")).await.unwrap();
    assert_eq!(handle.agent_id, AgentId::new("test-agent"));
    assert!(adapter.has_agent(&AgentId::new("test-agent")));

    adapter.kill(&AgentId::new("test-agent")).await.unwrap();
    assert!(!adapter.has_agent(&AgentId::new("test-agent")));
}

#[tokio::test]
async fn error_injection() {
    let adapter = FakeAgentAdapter::new();
    adapter.set_spawn_error(AgentError::SpawnFailed("test error".to_string()));

    let result = adapter.spawn(config("agent-1")).await;
    assert!(result.is_err());
    assert!(!adapter.has_agent(&AgentId::new("agent-1")));
}

#[tokio::test]
async fn send_to_unknown_agent_fails() {
    let adapter = FakeAgentAdapter::new();
    let result = adapter.send(&AgentId::new("nobody"), "hello").await;
    assert!(matches!(result, Err(AgentError::NotFound(_))));
}

#[tokio::test]
async fn call_recording() {
    let adapter = FakeAgentAdapter::new();

    adapter.spawn(config("agent-1")).await.unwrap();
    adapter
        .send(&AgentId::new("agent-1"), "hello")
        .await
        .unwrap();
    adapter.kill(&AgentId::new("agent-1")).await.unwrap();

    let calls = adapter.calls();
    assert_eq!(calls.len(), 3);

    assert!(
        matches!(&calls[0], AgentCall::Spawn { agent_id, .. } if agent_id == &AgentId::new("agent-1"))
    );
    assert!(
        matches!(&calls[1], AgentCall::Send { agent_id, input } if agent_id == &AgentId::new("agent-1") && input == "hello")
    );
    assert!(
        matches!(&calls[2], AgentCall::Kill { agent_id } if agent_id == &AgentId::new("agent-1"))
    );
}

#[tokio::test]
async fn reconnect_registers_agent_without_spawning() {
    let adapter = FakeAgentAdapter::new();
    let handle = adapter
        .reconnect(AgentReconnectConfig {
            agent_id: AgentId::new("agent-2"),
            session_id: "pano-agent-2".to_string(),
            workspace_path: PathBuf::from("/workspace"),
        })
        .await
        .unwrap();

    assert_eq!(handle.session_id, "pano-agent-2");
    assert!(adapter.has_agent(&AgentId::new("agent-2")));
}
