// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake upstream collaborators for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{BranchPusher, IssueTracker, UpstreamError};
use async_trait::async_trait;
use panopticon_core::IssueId;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One recorded call against a fake upstream collaborator.
#[derive(Debug, Clone)]
pub enum UpstreamCall {
    SetState { issue: IssueId, state: String },
    Close { issue: IssueId },
    Push { workspace: PathBuf, branch: String },
}

#[derive(Default)]
struct FakeUpstreamState {
    calls: Vec<UpstreamCall>,
    fail_next: bool,
}

#[derive(Clone, Default)]
pub struct FakeIssueTracker {
    inner: Arc<Mutex<FakeUpstreamState>>,
}

impl FakeIssueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<UpstreamCall> {
        self.inner.lock().calls.clone()
    }

    /// Make the next call return an error, for exercising best-effort
    /// callers that must tolerate failure.
    pub fn fail_next(&self) {
        self.inner.lock().fail_next = true;
    }
}

#[async_trait]
impl IssueTracker for FakeIssueTracker {
    async fn set_state(&self, issue: &IssueId, state: &str) -> Result<(), UpstreamError> {
        let mut inner = self.inner.lock();
        inner.calls.push(UpstreamCall::SetState {
            issue: issue.clone(),
            state: state.to_string(),
        });
        if std::mem::take(&mut inner.fail_next) {
            return Err(UpstreamError::RequestFailed("fake failure".into()));
        }
        Ok(())
    }

    async fn close(&self, issue: &IssueId) -> Result<(), UpstreamError> {
        let mut inner = self.inner.lock();
        inner.calls.push(UpstreamCall::Close {
            issue: issue.clone(),
        });
        if std::mem::take(&mut inner.fail_next) {
            return Err(UpstreamError::RequestFailed("fake failure".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeBranchPusher {
    inner: Arc<Mutex<FakeUpstreamState>>,
}

impl FakeBranchPusher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<UpstreamCall> {
        self.inner.lock().calls.clone()
    }

    pub fn fail_next(&self) {
        self.inner.lock().fail_next = true;
    }
}

#[async_trait]
impl BranchPusher for FakeBranchPusher {
    async fn push(&self, workspace: &Path, branch: &str) -> Result<(), UpstreamError> {
        let mut inner = self.inner.lock();
        inner.calls.push(UpstreamCall::Push {
            workspace: workspace.to_path_buf(),
            branch: branch.to_string(),
        });
        if std::mem::take(&mut inner.fail_next) {
            return Err(UpstreamError::RequestFailed("fake failure".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
