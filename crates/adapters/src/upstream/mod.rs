// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upstream collaborators: the issue-tracker adapter and the remote-branch
//! pusher. Both are opaque, injected, best-effort — failures are logged by
//! the caller and never fail the triggering operation.
//!
//! Issue-tracker adapters, git/worktree creation, and credentials loading
//! are out of scope for this crate; these traits exist so the Pipeline
//! Controller has something concrete to call, with a no-op
//! implementation standing in for the real adapter this crate doesn't own.

mod noop;

pub use noop::{NoOpBranchPusher, NoOpIssueTracker};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeBranchPusher, FakeIssueTracker, UpstreamCall};

use async_trait::async_trait;
use panopticon_core::IssueId;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum UpstreamError {
    #[error("upstream tracker request failed: {0}")]
    RequestFailed(String),
}

/// Sets and closes issue state in whatever tracker the deployment wires in
/// (Linear, GitHub Issues, Jira, ...). The engine never interprets
/// `state` beyond passing it through.
#[async_trait]
pub trait IssueTracker: Clone + Send + Sync + 'static {
    async fn set_state(&self, issue: &IssueId, state: &str) -> Result<(), UpstreamError>;
    async fn close(&self, issue: &IssueId) -> Result<(), UpstreamError>;
}

/// Pushes a workspace's feature branch to its remote ahead of handing the
/// issue to the review specialist.
#[async_trait]
pub trait BranchPusher: Clone + Send + Sync + 'static {
    async fn push(&self, workspace: &Path, branch: &str) -> Result<(), UpstreamError>;
}
