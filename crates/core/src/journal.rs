// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation Journal: durable record of in-flight, externally-visible
//! multi-step operations, kept so the control surface can show "in-flight"
//! badges and so a crash mid-operation is recoverable on restart.

use crate::IssueId;
use serde::{Deserialize, Serialize};

/// The kind of long-running operation being journaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Approve,
    Close,
    Containerize,
    Start,
    Review,
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Running,
    Failed,
}

/// One entry in `~/.panopticon/pending-operations.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub issue_id: IssueId,
    pub started_at_ms: u64,
    pub status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationRecord {
    pub fn start(op_type: OperationType, issue_id: IssueId, now_ms: u64) -> Self {
        Self {
            op_type,
            issue_id,
            started_at_ms: now_ms,
            status: OperationStatus::Running,
            error: None,
        }
    }

    /// Whether a `running` operation has outlived the staleness ceiling
    /// (Patrol Loop step 5 / restart recovery, default 10 min).
    pub fn is_stale(&self, now_ms: u64, ceiling_ms: u64) -> bool {
        self.status == OperationStatus::Running
            && now_ms.saturating_sub(self.started_at_ms) >= ceiling_ms
    }

    pub fn mark_timed_out(&mut self) {
        self.status = OperationStatus::Failed;
        self.error = Some("Operation timed out".to_string());
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
