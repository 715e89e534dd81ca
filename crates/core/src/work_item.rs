// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialist work queue entries.

use crate::{IssueId, WorkItemId, WorkspaceId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::PathBuf;

/// Queue entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    Task,
    Message,
    Notification,
}

/// Queue priority. Ordered so that `Urgent > High > Normal > Low` when
/// compared with `Ord` (derived top-to-bottom enum order is ascending, so
/// callers sort in reverse — see [`WorkItem::queue_cmp`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

/// Payload carried by a work item, enough context for the specialist to act
/// without a second round trip to the pipeline controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItemPayload {
    pub issue_id: IssueId,
    pub workspace: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<WorkspaceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

/// A single entry in a specialist's priority queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub kind: WorkItemKind,
    pub priority: Priority,
    pub source: String,
    pub payload: WorkItemPayload,
    pub created_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at_ms: Option<u64>,
}

impl WorkItem {
    /// Comparator implementing the queue ordering: priority descending,
    /// then `created_at_ms` ascending (FIFO within a priority band).
    pub fn queue_cmp(a: &WorkItem, b: &WorkItem) -> Ordering {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.created_at_ms.cmp(&b.created_at_ms))
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms.is_some_and(|exp| now_ms >= exp)
    }
}

#[cfg(test)]
#[path = "work_item_tests.rs"]
mod tests;
