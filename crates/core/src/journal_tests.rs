// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fresh_operation_is_running() {
    let op = OperationRecord::start(OperationType::Review, IssueId::new("PAN-1"), 1_000);
    assert_eq!(op.status, OperationStatus::Running);
    assert!(op.error.is_none());
}

#[test]
fn stale_just_under_ceiling_is_not_stale() {
    let op = OperationRecord::start(OperationType::Merge, IssueId::new("PAN-1"), 1_000);
    assert!(!op.is_stale(1_000 + 599_999, 600_000));
}

#[test]
fn stale_at_ceiling_is_stale() {
    let op = OperationRecord::start(OperationType::Merge, IssueId::new("PAN-1"), 1_000);
    assert!(op.is_stale(1_000 + 600_000, 600_000));
}

#[test]
fn failed_operation_is_never_stale() {
    let mut op = OperationRecord::start(OperationType::Close, IssueId::new("PAN-1"), 1_000);
    op.mark_timed_out();
    assert!(!op.is_stale(10_000_000, 600_000));
    assert_eq!(op.status, OperationStatus::Failed);
    assert_eq!(op.error.as_deref(), Some("Operation timed out"));
}