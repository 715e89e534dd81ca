// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker agent identity and the records the Agent State Store
//! persists per agent.

use crate::{AgentId, IssueId, WorkspaceId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Declared (not detected) runtime kind for a worker agent, e.g. the CLI
/// binary used to drive it. Opaque to the engine beyond being recorded.
pub type RuntimeKind = String;

/// `state.json`: identity and declared configuration, set at spawn time and
/// otherwise immutable except for the failure/kill counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: AgentId,
    pub issue_id: IssueId,
    pub workspace_path: PathBuf,
    #[serde(default)]
    pub workspace_id: Option<WorkspaceId>,
    pub runtime_kind: RuntimeKind,
    pub declared_model: String,
    pub started_at_ms: u64,
    /// Opaque resumable upstream-provider session token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default)]
    pub kill_count: u32,
}

impl AgentRecord {
    pub fn new(
        id: AgentId,
        issue_id: IssueId,
        workspace_path: PathBuf,
        runtime_kind: impl Into<String>,
        declared_model: impl Into<String>,
        started_at_ms: u64,
    ) -> Self {
        Self {
            id,
            issue_id,
            workspace_path,
            workspace_id: None,
            runtime_kind: runtime_kind.into(),
            declared_model: declared_model.into(),
            started_at_ms,
            session_token: None,
            consecutive_failures: 0,
            kill_count: 0,
        }
    }
}

/// State reported by the agent's own hook heartbeats (`POST
/// /agents/:id/heartbeat`), or derived when no heartbeat vocabulary applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRuntimeState {
    Working,
    WaitingForInput,
    Suspended,
    Exited,
    /// Vocabulary reported by a hook that the engine doesn't special-case;
    /// preserved verbatim rather than discarded.
    Other(String),
}

impl fmt::Display for WorkerRuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerRuntimeState::Working => write!(f, "working"),
            WorkerRuntimeState::WaitingForInput => write!(f, "waiting_for_input"),
            WorkerRuntimeState::Suspended => write!(f, "suspended"),
            WorkerRuntimeState::Exited => write!(f, "exited"),
            WorkerRuntimeState::Other(s) => write!(f, "{s}"),
        }
    }
}

/// `runtime.json`: the heartbeat sink, overwritten on every hook POST and
/// on suspend/resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeRecord {
    pub state: WorkerRuntimeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_issue: Option<IssueId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Default for RuntimeRecord {
    fn default() -> Self {
        Self {
            state: WorkerRuntimeState::Working,
            last_activity_ms: None,
            current_tool: None,
            current_issue: None,
            suspended_at_ms: None,
            session_id: None,
        }
    }
}

/// `health.json`: last computed classification, cached so a listing
/// request doesn't need to re-derive it from scratch under load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub status: HealthStatus,
    pub computed_at_ms: u64,
}

/// Health Classifier output. `Hidden` is never surfaced in listings —
/// it marks an agent with no live session and no recent state, i.e. nothing
/// worth reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Hidden,
    Dead,
    Suspended,
    Stuck,
    Warning,
    Stale,
    Active,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Hidden => "hidden",
            HealthStatus::Dead => "dead",
            HealthStatus::Suspended => "suspended",
            HealthStatus::Stuck => "stuck",
            HealthStatus::Warning => "warning",
            HealthStatus::Stale => "stale",
            HealthStatus::Active => "active",
        };
        write!(f, "{s}")
    }
}

/// Health threshold configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthThresholds {
    pub stale: Duration,
    pub warn: Duration,
    pub stuck: Duration,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            stale: Duration::from_secs(2 * 60),
            warn: Duration::from_secs(8 * 60),
            stuck: Duration::from_secs(20 * 60),
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
