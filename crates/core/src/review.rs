// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-issue ReviewStatus record and the invariants that govern its
//! transitions: `readyForMerge` derivation, the human-initiated review
//! reset, and the auto-requeue circuit breaker.

use serde::{Deserialize, Serialize};

/// Maximum value `auto_requeue_count` may reach before the pipeline halts
/// and requires human intervention.
pub const AUTO_REQUEUE_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Pending,
    Reviewing,
    Passed,
    Failed,
    Blocked,
}

impl ReviewState {
    /// Terminal states may only move back to `Reviewing` via a
    /// human-initiated review request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewState::Passed | ReviewState::Failed | ReviewState::Blocked)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestState {
    Pending,
    Testing,
    Passed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeState {
    Pending,
    Merging,
    Merged,
    Failed,
}

/// Per-issue ReviewStatus record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStatus {
    pub review_status: ReviewState,
    pub test_status: TestState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_status: Option<MergeState>,
    #[serde(default)]
    pub review_notes: String,
    #[serde(default)]
    pub test_notes: String,
    #[serde(default)]
    pub auto_requeue_count: u32,
    pub updated_at_ms: u64,
    pub ready_for_merge: bool,
}

impl ReviewStatus {
    pub fn fresh(now_ms: u64) -> Self {
        Self {
            review_status: ReviewState::Pending,
            test_status: TestState::Pending,
            merge_status: None,
            review_notes: String::new(),
            test_notes: String::new(),
            auto_requeue_count: 0,
            updated_at_ms: now_ms,
            ready_for_merge: false,
        }
    }

    /// Whether a review block contains feedback the human hasn't acted on
    /// yet — the `AlreadyReviewedNeedsAction` refusal condition.
    pub fn needs_human_action(&self) -> bool {
        matches!(self.review_status, ReviewState::Blocked | ReviewState::Failed)
            && !self.review_notes.is_empty()
    }

    /// Derive `readyForMerge` from the current triple. Callers that set
    /// `ready_for_merge` explicitly (an override update) must not call this
    /// afterward — see the `explicit` variants on the mutating methods.
    pub fn derive_ready_for_merge(&self) -> bool {
        self.review_status == ReviewState::Passed
            && self.test_status == TestState::Passed
            && self.merge_status != Some(MergeState::Merged)
    }

    fn recompute(&mut self, now_ms: u64) {
        self.ready_for_merge = self.derive_ready_for_merge();
        self.updated_at_ms = now_ms;
    }

    /// Human-initiated `/review` start. Refuses if a terminal
    /// blocked/failed review still carries unread notes.
    pub fn start_review(&mut self, now_ms: u64) -> Result<(), AlreadyReviewedNeedsAction> {
        if self.needs_human_action() {
            return Err(AlreadyReviewedNeedsAction {
                review_notes: self.review_notes.clone(),
            });
        }
        self.review_status = ReviewState::Reviewing;
        // Open Question, resolved in DESIGN.md: a human-initiated review
        // resets both reviewStatus and testStatus, not reviewStatus alone.
        self.test_status = TestState::Pending;
        self.auto_requeue_count = 0;
        self.recompute(now_ms);
        Ok(())
    }

    pub fn review_passed(&mut self, now_ms: u64) {
        self.review_status = ReviewState::Passed;
        self.recompute(now_ms);
    }

    pub fn review_blocked_or_failed(&mut self, failed: bool, notes: String, now_ms: u64) {
        self.review_status = if failed { ReviewState::Failed } else { ReviewState::Blocked };
        self.review_notes = notes;
        self.recompute(now_ms);
    }

    pub fn test_passed(&mut self, now_ms: u64) {
        self.test_status = TestState::Passed;
        self.recompute(now_ms);
    }

    /// `specialist=test, status=failed`: records notes and reports whether
    /// the circuit breaker still allows an automatic requeue.
    pub fn test_failed(&mut self, notes: String, now_ms: u64) -> bool {
        self.test_status = TestState::Failed;
        self.test_notes = notes;
        self.recompute(now_ms);
        if self.auto_requeue_count < AUTO_REQUEUE_LIMIT {
            self.auto_requeue_count += 1;
            true
        } else {
            false
        }
    }

    pub fn merged(&mut self, now_ms: u64) {
        self.merge_status = Some(MergeState::Merged);
        self.ready_for_merge = false;
        self.updated_at_ms = now_ms;
    }

    pub fn merge_failed(&mut self, now_ms: u64) {
        self.merge_status = Some(MergeState::Failed);
        self.recompute(now_ms);
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("review already has unread notes pending human action")]
pub struct AlreadyReviewedNeedsAction {
    pub review_notes: String,
}

#[cfg(test)]
#[path = "review_tests.rs"]
mod tests;
