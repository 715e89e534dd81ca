// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op upstream collaborators, used when no issue tracker or remote is
//! configured.

use super::{BranchPusher, IssueTracker, UpstreamError};
use async_trait::async_trait;
use panopticon_core::IssueId;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpIssueTracker;

impl NoOpIssueTracker {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl IssueTracker for NoOpIssueTracker {
    async fn set_state(&self, _issue: &IssueId, _state: &str) -> Result<(), UpstreamError> {
        Ok(())
    }

    async fn close(&self, _issue: &IssueId) -> Result<(), UpstreamError> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpBranchPusher;

impl NoOpBranchPusher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BranchPusher for NoOpBranchPusher {
    async fn push(&self, _workspace: &Path, _branch: &str) -> Result<(), UpstreamError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
