// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use panopticon_core::ReviewStatus;
use tempfile::tempdir;

fn store() -> (tempfile::TempDir, ReviewStatusStore) {
    let dir = tempdir().unwrap();
    let store = ReviewStatusStore::open(dir.path().join("review-status.json")).unwrap();
    (dir, store)
}

#[test]
fn get_missing_issue_is_none() {
    let (_dir, store) = store();
    assert!(store.get(&IssueId::new("PAN-1")).is_none());
}

#[test]
fn merge_creates_fresh_record_when_absent() {
    let (_dir, store) = store();
    let issue = IssueId::new("PAN-100");
    store
        .merge(&issue, |existing| existing.unwrap_or_else(|| ReviewStatus::fresh(1_000)))
        .unwrap();
    assert!(store.get(&issue).is_some());
}

#[test]
fn merge_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("review-status.json");
    let issue = IssueId::new("PAN-100");
    {
        let store = ReviewStatusStore::open(&path).unwrap();
        store
            .merge(&issue, |_| ReviewStatus::fresh(1_000))
            .unwrap();
    }
    let reopened = ReviewStatusStore::open(&path).unwrap();
    assert!(reopened.get(&issue).is_some());
}

#[test]
fn all_returns_every_tracked_issue() {
    let (_dir, store) = store();
    store
        .merge(&IssueId::new("PAN-1"), |_| ReviewStatus::fresh(1))
        .unwrap();
    store
        .merge(&IssueId::new("PAN-2"), |_| ReviewStatus::fresh(2))
        .unwrap();
    assert_eq!(store.all().len(), 2);
}

#[test]
fn remove_drops_the_issue() {
    let (_dir, store) = store();
    let issue = IssueId::new("PAN-1");
    store.merge(&issue, |_| ReviewStatus::fresh(1)).unwrap();
    store.remove(&issue).unwrap();
    assert!(store.get(&issue).is_none());
}
