// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation Journal: `~/.panopticon/pending-operations.json`, a
//! durable list of in-flight externally-visible operations. On success an
//! entry is removed; on failure it's retained with `status=failed` so the
//! control surface can show an "in-flight"/"failed" badge.

use crate::atomic::{read_json_opt, write_json_atomic};
use crate::StorageResult;
use panopticon_core::{IssueId, OperationRecord, OperationType};
use parking_lot::RwLock;
use std::path::PathBuf;

pub struct OperationJournal {
    path: PathBuf,
    cache: RwLock<Vec<OperationRecord>>,
}

impl OperationJournal {
    /// `path` is the `pending-operations.json` file itself.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let loaded: Vec<OperationRecord> = read_json_opt(&path)?.unwrap_or_default();
        Ok(Self {
            path,
            cache: RwLock::new(loaded),
        })
    }

    fn persist(&self, records: &[OperationRecord]) -> StorageResult<()> {
        write_json_atomic(&self.path, &records.to_vec())
    }

    /// Record the start of a long-running operation as `running`.
    pub fn start(&self, record: OperationRecord) -> StorageResult<()> {
        let mut records = self.cache.write();
        records.retain(|r| !(r.op_type == record.op_type && r.issue_id == record.issue_id));
        records.push(record);
        self.persist(&records)
    }

    /// Remove the matching entry entirely — the success path.
    pub fn complete(&self, op_type: OperationType, issue_id: &IssueId) -> StorageResult<()> {
        let mut records = self.cache.write();
        records.retain(|r| !(r.op_type == op_type && r.issue_id == *issue_id));
        self.persist(&records)
    }

    /// Mark the matching entry `failed` with `error`, retaining it.
    pub fn fail(
        &self,
        op_type: OperationType,
        issue_id: &IssueId,
        error: impl Into<String>,
    ) -> StorageResult<()> {
        let mut records = self.cache.write();
        if let Some(record) = records
            .iter_mut()
            .find(|r| r.op_type == op_type && r.issue_id == *issue_id)
        {
            record.status = panopticon_core::OperationStatus::Failed;
            record.error = Some(error.into());
        }
        self.persist(&records)
    }

    pub fn list(&self) -> Vec<OperationRecord> {
        self.cache.read().clone()
    }

    /// Restart-recovery / Patrol step 5: rewrite any `running` entry older
    /// than `ceiling_ms` to `failed` with "Operation timed out". Returns the
    /// entries that were timed out.
    pub fn expire_stale(&self, now_ms: u64, ceiling_ms: u64) -> StorageResult<Vec<OperationRecord>> {
        let mut records = self.cache.write();
        let mut timed_out = Vec::new();
        for record in records.iter_mut() {
            if record.is_stale(now_ms, ceiling_ms) {
                record.mark_timed_out();
                timed_out.push(record.clone());
            }
        }
        if !timed_out.is_empty() {
            self.persist(&records)?;
        }
        Ok(timed_out)
    }
}

#[cfg(test)]
#[path = "journal_store_tests.rs"]
mod tests;
