// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain identifiers.
//!
//! `AgentId` (worker) is distinct from the session id tracked internally by
//! adapters, and from `WorkspaceId` (the workspace directory). `IssueId` is
//! the opaque identifier handed to us by whatever issue tracker the caller
//! wired in — this engine never interprets its structure.

crate::define_id! {
    /// Opaque issue identifier (e.g. `PAN-100`), owned by the issue tracker.
    pub struct IssueId;
}

crate::define_id! {
    /// Unique identifier for a worker agent: `agent-<issue-id-lower>`.
    pub struct AgentId;
}

impl AgentId {
    /// Derive the canonical worker agent id for an issue.
    pub fn for_issue(issue: &IssueId) -> Self {
        Self::new(format!("agent-{}", issue.as_str().to_lowercase()))
    }
}

crate::define_id! {
    /// Identifier for a workspace directory backing a worker agent.
    pub struct WorkspaceId;
}

crate::define_id! {
    /// Stable id of a queued [`crate::WorkItem`], permitting reorder/remove.
    pub struct WorkItemId;
}
