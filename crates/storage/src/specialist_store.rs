// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialist Registry persistence: per-name session token, priority
//! queue, and lifecycle record under `specialists/<name>/`, plus a
//! per-issue status note (`<issue>-status.json`) — a lightweight audit
//! trail of the last report a specialist filed for an issue, distinct from
//! the canonical `review-status.json` (see [`crate::review_store`]).

use crate::atomic::{read_json_opt, write_json_atomic};
use crate::StorageResult;
use panopticon_core::{IssueId, SpecialistName, SpecialistRecord, WorkItem, WorkItemId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueStatusNote {
    pub issue_id: IssueId,
    pub status: String,
    #[serde(default)]
    pub notes: String,
    pub reported_at_ms: u64,
}

#[derive(Clone)]
pub struct SpecialistStore {
    root: PathBuf,
}

impl SpecialistStore {
    /// `root` is the `specialists/` directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir(&self, name: SpecialistName) -> PathBuf {
        self.root.join(name.as_str())
    }

    fn state_path(&self, name: SpecialistName) -> PathBuf {
        self.dir(name).join("state.json")
    }

    fn queue_path(&self, name: SpecialistName) -> PathBuf {
        self.dir(name).join("queue.json")
    }

    fn session_id_path(&self, name: SpecialistName) -> PathBuf {
        self.dir(name).join("session-id")
    }

    fn issue_status_path(&self, name: SpecialistName, issue: &IssueId) -> PathBuf {
        self.dir(name)
            .join(format!("{}-status.json", issue.as_str()))
    }

    pub fn load_record(&self, name: SpecialistName) -> StorageResult<Option<SpecialistRecord>> {
        read_json_opt(&self.state_path(name))
    }

    pub fn save_record(&self, record: &SpecialistRecord) -> StorageResult<()> {
        write_json_atomic(&self.state_path(record.name), record)
    }

    /// Read-modify-write the specialist record, seeding a fresh
    /// `Uninitialized` record on first touch rather than erroring — unlike
    /// the Agent State Store, specialists always exist conceptually (the
    /// set is closed), they just may not have been persisted yet.
    pub fn merge_record(
        &self,
        name: SpecialistName,
        f: impl FnOnce(&mut SpecialistRecord),
    ) -> StorageResult<SpecialistRecord> {
        let mut record = self
            .load_record(name)?
            .unwrap_or_else(|| SpecialistRecord::new(name));
        f(&mut record);
        self.save_record(&record)?;
        Ok(record)
    }

    pub fn read_session_token(&self, name: SpecialistName) -> StorageResult<Option<String>> {
        match std::fs::read_to_string(self.session_id_path(name)) {
            Ok(s) => Ok(Some(s.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_session_token(&self, name: SpecialistName, token: &str) -> StorageResult<()> {
        let path = self.session_id_path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, token)?;
        Ok(())
    }

    pub fn load_queue(&self, name: SpecialistName) -> StorageResult<Vec<WorkItem>> {
        Ok(read_json_opt(&self.queue_path(name))?.unwrap_or_default())
    }

    fn save_queue(&self, name: SpecialistName, items: &[WorkItem]) -> StorageResult<()> {
        write_json_atomic(&self.queue_path(name), &items.to_vec())
    }

    /// Insert `item` keeping the queue ordered (priority descending,
    /// `created_at_ms` ascending).
    pub fn enqueue(&self, name: SpecialistName, item: WorkItem) -> StorageResult<()> {
        let mut items = self.load_queue(name)?;
        let pos = items
            .binary_search_by(|existing| WorkItem::queue_cmp(existing, &item))
            .unwrap_or_else(|p| p);
        items.insert(pos, item);
        self.save_queue(name, &items)
    }

    /// Remove and return the head of the queue.
    pub fn dequeue(&self, name: SpecialistName) -> StorageResult<Option<WorkItem>> {
        let mut items = self.load_queue(name)?;
        if items.is_empty() {
            return Ok(None);
        }
        let head = items.remove(0);
        self.save_queue(name, &items)?;
        Ok(Some(head))
    }

    pub fn peek(&self, name: SpecialistName) -> StorageResult<Option<WorkItem>> {
        Ok(self.load_queue(name)?.into_iter().next())
    }

    pub fn list(&self, name: SpecialistName) -> StorageResult<Vec<WorkItem>> {
        self.load_queue(name)
    }

    /// `enqueue(x); remove(x)` leaves the queue pointwise equal to its
    /// prior state.
    pub fn remove(&self, name: SpecialistName, id: &WorkItemId) -> StorageResult<Option<WorkItem>> {
        let mut items = self.load_queue(name)?;
        let idx = items.iter().position(|i| &i.id == id);
        let removed = idx.map(|i| items.remove(i));
        if removed.is_some() {
            self.save_queue(name, &items)?;
        }
        Ok(removed)
    }

    /// Reorder so that `list()` subsequently returns exactly `ids`, when
    /// `ids` is a permutation of the current queue's ids. Ids not present in
    /// the current queue are ignored; queue items whose id is missing from
    /// `ids` are appended after, preserving their relative order.
    pub fn reorder(&self, name: SpecialistName, ids: &[WorkItemId]) -> StorageResult<()> {
        let items = self.load_queue(name)?;
        let mut by_id: std::collections::HashMap<WorkItemId, WorkItem> =
            items.into_iter().map(|i| (i.id.clone(), i)).collect();
        let mut reordered = Vec::with_capacity(by_id.len());
        for id in ids {
            if let Some(item) = by_id.remove(id) {
                reordered.push(item);
            }
        }
        let mut leftovers: Vec<WorkItem> = by_id.into_values().collect();
        leftovers.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms));
        reordered.extend(leftovers);
        self.save_queue(name, &reordered)
    }

    /// Drop queue entries whose `expires_at_ms` has elapsed (Patrol step 4).
    /// Returns the expired items.
    pub fn expire(&self, name: SpecialistName, now_ms: u64) -> StorageResult<Vec<WorkItem>> {
        let items = self.load_queue(name)?;
        let (expired, kept): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|i| i.is_expired(now_ms));
        if !expired.is_empty() {
            self.save_queue(name, &kept)?;
        }
        Ok(expired)
    }

    pub fn save_issue_status(
        &self,
        name: SpecialistName,
        note: &IssueStatusNote,
    ) -> StorageResult<()> {
        write_json_atomic(&self.issue_status_path(name, &note.issue_id), note)
    }

    pub fn load_issue_status(
        &self,
        name: SpecialistName,
        issue: &IssueId,
    ) -> StorageResult<Option<IssueStatusNote>> {
        read_json_opt(&self.issue_status_path(name, issue))
    }
}

#[cfg(test)]
#[path = "specialist_store_tests.rs"]
mod tests;
