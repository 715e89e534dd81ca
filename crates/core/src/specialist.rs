// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialist identity and lifecycle state.
//!
//! Specialists are a closed set of three singleton agents shared across
//! issues via per-name priority queues — unlike worker agents, which are
//! created dynamically per issue, so `SpecialistName` is a fixed enum
//! rather than a newtype string.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three singleton specialist agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialistName {
    ReviewAgent,
    TestAgent,
    MergeAgent,
}

impl SpecialistName {
    pub const ALL: [SpecialistName; 3] = [
        SpecialistName::ReviewAgent,
        SpecialistName::TestAgent,
        SpecialistName::MergeAgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialistName::ReviewAgent => "review-agent",
            SpecialistName::TestAgent => "test-agent",
            SpecialistName::MergeAgent => "merge-agent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "review-agent" | "review" => Some(SpecialistName::ReviewAgent),
            "test-agent" | "test" => Some(SpecialistName::TestAgent),
            "merge-agent" | "merge" => Some(SpecialistName::MergeAgent),
            _ => None,
        }
    }
}

impl fmt::Display for SpecialistName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runtime lifecycle state of a specialist singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpecialistRuntimeState {
    #[default]
    Uninitialized,
    Idle,
    Active,
    Suspended,
}

impl SpecialistRuntimeState {
    /// Whether a specialist in this state is eligible for `wakeWithTask`.
    ///
    /// Source treats `suspended` as eligible for wake (Open Question,
    /// resolved in DESIGN.md); `active` never is — only one live session
    /// per specialist name.
    pub fn is_wake_eligible(&self) -> bool {
        matches!(
            self,
            SpecialistRuntimeState::Uninitialized
                | SpecialistRuntimeState::Idle
                | SpecialistRuntimeState::Suspended
        )
    }
}

/// Persisted per-specialist record (`specialists/<name>/...` on disk).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistRecord {
    pub name: SpecialistName,
    pub state: SpecialistRuntimeState,
    /// Opaque resumable upstream-provider session token, kept across sleep/wake.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    /// Id of the currently live session adapter handle, if any — the value
    /// `SessionAdapter::spawn` returned, not recomputed from `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_wake_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_issue: Option<crate::IssueId>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub auto_wake: bool,
}

impl SpecialistRecord {
    pub fn new(name: SpecialistName) -> Self {
        Self {
            name,
            state: SpecialistRuntimeState::Uninitialized,
            session_token: None,
            session_id: None,
            last_wake_ms: None,
            current_issue: None,
            enabled: true,
            auto_wake: true,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state == SpecialistRuntimeState::Active
    }
}

#[cfg(test)]
#[path = "specialist_tests.rs"]
mod tests;
