// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use panopticon_core::{MergeState, ReviewState, ReviewStatus, TestState};

use super::*;

#[test]
fn is_settled_false_for_fresh_status() {
    assert!(!is_settled(&ReviewStatus::fresh(0)));
}

#[test]
fn is_settled_true_when_ready_for_merge() {
    let mut status = ReviewStatus::fresh(0);
    status.review_status = ReviewState::Passed;
    status.test_status = TestState::Passed;
    status.ready_for_merge = status.derive_ready_for_merge();
    assert!(is_settled(&status));
}

#[test]
fn is_settled_true_when_needs_human_action() {
    let mut status = ReviewStatus::fresh(0);
    status.review_blocked_or_failed(true, "missing tests".to_string(), 1);
    assert!(is_settled(&status));
}

#[test]
fn is_settled_true_once_merged() {
    let mut status = ReviewStatus::fresh(0);
    status.merged(1);
    assert!(is_settled(&status));
}

#[test]
fn is_settled_false_while_merge_in_flight() {
    let mut status = ReviewStatus::fresh(0);
    status.review_status = ReviewState::Passed;
    status.test_status = TestState::Passed;
    status.merge_status = Some(MergeState::Merging);
    assert!(!is_settled(&status));
}