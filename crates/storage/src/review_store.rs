// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ReviewStatus store: `~/.panopticon/review-status.json`, a map
//! `issueId → ReviewStatus`. Unlike the Agent State Store and Specialist
//! Registry, this is a single shared file — cross-issue updates may
//! interleave at the OS level, but each individual write is atomic
//! (write-temp-then-rename) and an in-process `RwLock` serializes
//! read-modify-write within this engine instance.

use crate::atomic::{read_json_opt, write_json_atomic};
use crate::StorageResult;
use panopticon_core::{IssueId, ReviewStatus};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;

pub struct ReviewStatusStore {
    path: PathBuf,
    cache: RwLock<HashMap<IssueId, ReviewStatus>>,
}

impl ReviewStatusStore {
    /// `path` is the `review-status.json` file itself.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let loaded: HashMap<IssueId, ReviewStatus> = read_json_opt(&path)?.unwrap_or_default();
        Ok(Self {
            path,
            cache: RwLock::new(loaded),
        })
    }

    pub fn get(&self, issue: &IssueId) -> Option<ReviewStatus> {
        self.cache.read().get(issue).cloned()
    }

    pub fn all(&self) -> HashMap<IssueId, ReviewStatus> {
        self.cache.read().clone()
    }

    /// Read-modify-write a single issue's record. `f` receives `None` when
    /// the issue has no record yet (fresh issue).
    pub fn merge(
        &self,
        issue: &IssueId,
        f: impl FnOnce(Option<ReviewStatus>) -> ReviewStatus,
    ) -> StorageResult<ReviewStatus> {
        let mut cache = self.cache.write();
        let current = cache.get(issue).cloned();
        let updated = f(current);
        cache.insert(issue.clone(), updated.clone());
        write_json_atomic(&self.path, &*cache)?;
        Ok(updated)
    }

    pub fn remove(&self, issue: &IssueId) -> StorageResult<()> {
        let mut cache = self.cache.write();
        cache.remove(issue);
        write_json_atomic(&self.path, &*cache)
    }
}

#[cfg(test)]
#[path = "review_store_tests.rs"]
mod tests;
