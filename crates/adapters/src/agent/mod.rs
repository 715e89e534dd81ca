// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-agent process adapter.
//!
//! `AgentAdapter` sits on top of [`crate::session::SessionAdapter`] and adds
//! the Claude-Code-specific spawn sequence: workspace preparation, the
//! trust/bypass-permissions/login interactive prompts a fresh session shows
//! before it's usable, and session-token bookkeeping for resume.
//!
//! Unlike the terminal session itself, this adapter does not infer or track
//! agent health or completion state — that comes from the heartbeat and
//! completion-report contracts (engine-side) and from periodic liveness
//! polling against the session adapter, never from watching this process.

mod claude;

pub use claude::{extract_process_name, ClaudeAgentAdapter};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{AgentCall, FakeAgentAdapter};

use async_trait::async_trait;
use panopticon_core::AgentId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from agent operations
#[derive(Debug, Error, Clone)]
pub enum AgentError {
    #[error("agent not found: {0}")]
    NotFound(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("kill failed: {0}")]
    KillFailed(String),
    #[error("session error: {0}")]
    SessionError(String),
    #[error("workspace error: {0}")]
    WorkspaceError(String),
}

/// Configuration for spawning a new worker agent.
#[derive(Debug, Clone)]
pub struct AgentSpawnConfig {
    /// Unique identifier for this agent instance (`agent-<issue-lower>`).
    pub agent_id: AgentId,
    /// Command to execute (e.g. `"claude"`).
    pub command: String,
    /// Extra args appended to the command.
    pub args: Vec<String>,
    /// Environment variables for the session.
    pub env: Vec<(String, String)>,
    /// Path to the agent's workspace (git worktree).
    pub workspace_path: PathBuf,
    /// Optional working directory override (defaults to `workspace_path`).
    pub cwd: Option<PathBuf>,
    /// Root of the project the workspace was checked out from.
    pub project_root: PathBuf,
    /// Initial prompt to send once the session is ready.
    pub prompt: String,
}

/// Configuration for reconnecting to an existing agent session (after
/// daemon restart, or to resume a suspended worker).
#[derive(Debug, Clone)]
pub struct AgentReconnectConfig {
    pub agent_id: AgentId,
    pub session_id: String,
    pub workspace_path: PathBuf,
}

/// Handle to a running agent.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    pub agent_id: AgentId,
    pub session_id: String,
    pub workspace_path: PathBuf,
}

impl AgentHandle {
    pub fn new(agent_id: AgentId, session_id: String, workspace_path: PathBuf) -> Self {
        Self {
            agent_id,
            session_id,
            workspace_path,
        }
    }
}

/// Adapter for spawning and driving worker-agent processes.
#[async_trait]
pub trait AgentAdapter: Clone + Send + Sync + 'static {
    /// Spawn a new agent: prepares the workspace, starts the underlying
    /// session, and clears any interactive prompts the process shows before
    /// accepting the initial task.
    async fn spawn(&self, config: AgentSpawnConfig) -> Result<AgentHandle, AgentError>;

    /// Send input to a running agent (clears the input line first, then
    /// types the text and submits it).
    async fn send(&self, agent_id: &AgentId, input: &str) -> Result<(), AgentError>;

    /// Kill an agent's session.
    async fn kill(&self, agent_id: &AgentId) -> Result<(), AgentError>;

    /// Reconnect to an already-running session (daemon restart recovery, or
    /// resuming a suspended worker). Does not spawn a new process.
    async fn reconnect(&self, config: AgentReconnectConfig) -> Result<AgentHandle, AgentError>;
}
