// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake agent adapter for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AgentAdapter, AgentError, AgentHandle, AgentReconnectConfig, AgentSpawnConfig};
use async_trait::async_trait;
use panopticon_core::AgentId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Recorded call to FakeAgentAdapter
#[derive(Debug, Clone)]
pub enum AgentCall {
    Spawn { agent_id: AgentId, command: String },
    Reconnect { agent_id: AgentId, session_id: String },
    Send { agent_id: AgentId, input: String },
    Kill { agent_id: AgentId },
}

/// Fake agent adapter for testing.
///
/// Allows programmatic control over agent behavior and records all calls.
#[derive(Clone)]
pub struct FakeAgentAdapter {
    inner: Arc<Mutex<FakeAgentState>>,
}

struct FakeAgentState {
    agents: HashMap<AgentId, PathBuf>,
    calls: Vec<AgentCall>,
    spawn_error: Option<AgentError>,
    send_error: Option<AgentError>,
    kill_error: Option<AgentError>,
}

impl Default for FakeAgentAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAgentAdapter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeAgentState {
                agents: HashMap::new(),
                calls: Vec::new(),
                spawn_error: None,
                send_error: None,
                kill_error: None,
            })),
        }
    }

    pub fn calls(&self) -> Vec<AgentCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    pub fn set_spawn_error(&self, error: AgentError) {
        self.inner.lock().spawn_error = Some(error);
    }

    pub fn set_send_error(&self, error: AgentError) {
        self.inner.lock().send_error = Some(error);
    }

    pub fn set_kill_error(&self, error: AgentError) {
        self.inner.lock().kill_error = Some(error);
    }

    pub fn has_agent(&self, agent_id: &AgentId) -> bool {
        self.inner.lock().agents.contains_key(agent_id)
    }

    pub fn agent_count(&self) -> usize {
        self.inner.lock().agents.len()
    }
}

#[async_trait]
impl AgentAdapter for FakeAgentAdapter {
    async fn spawn(&self, config: AgentSpawnConfig) -> Result<AgentHandle, AgentError> {
        let mut inner = self.inner.lock();
        inner.calls.push(AgentCall::Spawn {
            agent_id: config.agent_id.clone(),
            command: config.command.clone(),
        });
        if let Some(error) = inner.spawn_error.take() {
            return Err(error);
        }
        inner
            .agents
            .insert(config.agent_id.clone(), config.workspace_path.clone());
        Ok(AgentHandle::new(
            config.agent_id.clone(),
            config.agent_id.to_string(),
            config.workspace_path,
        ))
    }

    async fn reconnect(&self, config: AgentReconnectConfig) -> Result<AgentHandle, AgentError> {
        let mut inner = self.inner.lock();
        inner.calls.push(AgentCall::Reconnect {
            agent_id: config.agent_id.clone(),
            session_id: config.session_id.clone(),
        });
        if let Some(error) = inner.spawn_error.take() {
            return Err(error);
        }
        inner
            .agents
            .insert(config.agent_id.clone(), config.workspace_path.clone());
        Ok(AgentHandle::new(
            config.agent_id,
            config.session_id,
            config.workspace_path,
        ))
    }

    async fn send(&self, agent_id: &AgentId, input: &str) -> Result<(), AgentError> {
        let mut inner = self.inner.lock();
        inner.calls.push(AgentCall::Send {
            agent_id: agent_id.clone(),
            input: input.to_string(),
        });
        if let Some(error) = inner.send_error.take() {
            return Err(error);
        }
        if !inner.agents.contains_key(agent_id) {
            return Err(AgentError::NotFound(agent_id.to_string()));
        }
        Ok(())
    }

    async fn kill(&self, agent_id: &AgentId) -> Result<(), AgentError> {
        let mut inner = self.inner.lock();
        inner.calls.push(AgentCall::Kill {
            agent_id: agent_id.clone(),
        });
        if let Some(error) = inner.kill_error.take() {
            return Err(error);
        }
        inner
            .agents
            .remove(agent_id)
            .ok_or_else(|| AgentError::NotFound(agent_id.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
