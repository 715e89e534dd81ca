// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use panopticon_adapters::agent::{AgentCall, AgentError, FakeAgentAdapter};
use panopticon_core::FakeClock;

type TestSupervisor = WorkerSupervisor<FakeAgentAdapter, FakeClock>;

fn supervisor() -> (tempfile::TempDir, TestSupervisor, FakeAgentAdapter) {
    let dir = tempfile::tempdir().unwrap();
    let store = AgentStore::new(dir.path().join("agents"));
    let agents = FakeAgentAdapter::new();
    let sup = WorkerSupervisor::new(
        store,
        agents.clone(),
        GlobalMutationLock::new(),
        FakeClock::default(),
        WorkerCommand::default(),
        100,
    );
    (dir, sup, agents)
}

#[tokio::test]
async fn spawn_creates_durable_state_and_a_live_session() {
    let (_dir, sup, agents) = supervisor();
    let issue = IssueId::new("PAN-1");
    let record = sup
        .spawn(issue.clone(), PathBuf::from("/tmp/ws-pan-1"), "claude-code", "sonnet")
        .await
        .unwrap();

    assert_eq!(record.id, AgentId::for_issue(&issue));
    assert_eq!(record.declared_model, "sonnet");
    assert!(agents.has_agent(&record.id));
    assert_eq!(sup.record(&issue).unwrap().unwrap().id, record.id);
}

#[tokio::test]
async fn kill_purges_state_so_the_agent_disappears_from_listings() {
    let (_dir, sup, _agents) = supervisor();
    let issue = IssueId::new("PAN-2");
    let record = sup
        .spawn(issue.clone(), PathBuf::from("/tmp/ws-pan-2"), "claude-code", "sonnet")
        .await
        .unwrap();

    sup.kill(&record.id).await.unwrap();
    assert!(sup.record(&issue).unwrap().is_none());
}

#[tokio::test]
async fn double_kill_is_not_an_error() {
    let (_dir, sup, _agents) = supervisor();
    let agent_id = AgentId::new("agent-pan-404");
    sup.kill(&agent_id).await.unwrap();
    sup.kill(&agent_id).await.unwrap();
}

#[tokio::test]
async fn poke_sends_the_default_nudge_when_no_message_given() {
    let (_dir, sup, agents) = supervisor();
    let issue = IssueId::new("PAN-3");
    let record = sup
        .spawn(issue, PathBuf::from("/tmp/ws-pan-3"), "claude-code", "sonnet")
        .await
        .unwrap();

    sup.poke(&record.id, None).await.unwrap();

    let sent = agents.calls();
    assert!(sent.iter().any(|c| matches!(
        c,
        AgentCall::Send { input, .. } if input == DEFAULT_POKE_MESSAGE
    )));
}

#[tokio::test]
async fn suspend_records_runtime_state_and_kills_the_session() {
    let (_dir, sup, agents) = supervisor();
    let issue = IssueId::new("PAN-4");
    let record = sup
        .spawn(issue, PathBuf::from("/tmp/ws-pan-4"), "claude-code", "sonnet")
        .await
        .unwrap();

    sup.suspend(&record.id, Some("tok-xyz")).await.unwrap();

    assert!(!agents.has_agent(&record.id));
    let runtime = sup.record(&record.issue_id).unwrap().unwrap();
    assert_eq!(runtime.session_token.as_deref(), Some("tok-xyz"));
}

#[tokio::test]
async fn resume_fails_with_invariant_violated_when_no_token_on_file() {
    let (_dir, sup, _agents) = supervisor();
    let issue = IssueId::new("PAN-5");
    let record = sup
        .spawn(issue, PathBuf::from("/tmp/ws-pan-5"), "claude-code", "sonnet")
        .await
        .unwrap();

    let err = sup.resume(&record.id, None).await.unwrap_err();
    assert!(matches!(err, EngineError::InvariantViolated(_)));
}

#[tokio::test]
async fn handoff_changes_declared_model_and_records_activity() {
    let (_dir, sup, agents) = supervisor();
    let issue = IssueId::new("PAN-6");
    let record = sup
        .spawn(issue, PathBuf::from("/tmp/ws-pan-6"), "claude-code", "sonnet")
        .await
        .unwrap();

    let updated = sup.handoff(&record.id, "opus", Some("needs deeper reasoning")).await.unwrap();
    assert_eq!(updated.declared_model, "opus");
    assert!(agents.has_agent(&record.id));

    let activity = sup.read_activity(&record.id, 10).unwrap();
    assert!(activity.iter().any(|e| e["type"] == "handoff" && e["to_model"] == "opus"));
}

#[tokio::test]
async fn send_message_surfaces_agent_not_found_for_an_unknown_agent() {
    let (_dir, sup, agents) = supervisor();
    agents.set_send_error(AgentError::NotFound("agent-pan-ghost".to_string()));
    let agent_id = AgentId::new("agent-pan-ghost");
    let err = sup.send_message(&agent_id, "hello").await.unwrap_err();
    assert!(matches!(err, EngineError::Session { .. }));
}

#[tokio::test]
async fn record_heartbeat_updates_runtime_and_appends_activity() {
    let (_dir, sup, _agents) = supervisor();
    let issue = IssueId::new("PAN-7");
    let record = sup
        .spawn(issue, PathBuf::from("/tmp/ws-pan-7"), "claude-code", "sonnet")
        .await
        .unwrap();

    sup.record_heartbeat(&record.id, WorkerRuntimeState::Working, Some("edit_file"), None)
        .unwrap();

    let activity = sup.read_activity(&record.id, 10).unwrap();
    assert!(activity.iter().any(|e| e["type"] == "heartbeat" && e["tool"] == "edit_file"));
}
