// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline Controller: owns the per-issue `ReviewStatus` record and
//! drives its review → test → merge transitions, auto-delivering specialist
//! feedback to the worker agent, auto-enqueueing the next specialist, and
//! enforcing the auto-requeue circuit breaker.
//!
//! Upstream-tracker and branch-push calls are best-effort: their failures
//! are logged and never fail the triggering operation.

use crate::convert::storage_err;
use crate::lock::GlobalMutationLock;
use crate::specialists::{SpecialistRegistry, WakeOutcome};
use crate::workers::WorkerSupervisor;
use panopticon_adapters::agent::AgentAdapter;
use panopticon_adapters::session::SessionAdapter;
use panopticon_adapters::upstream::{BranchPusher, IssueTracker};
use panopticon_core::{
    AlreadyReviewedNeedsAction, Clock, EngineError, EngineResult, IdGen, IssueId, Priority,
    ReviewStatus, SpecialistName, WorkItem, WorkItemId, WorkItemKind, WorkItemPayload,
};
use panopticon_storage::ReviewStatusStore;
use std::path::PathBuf;

/// Outcome of [`PipelineController::start_review`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartReviewOutcome {
    Started,
    Queued,
}

/// The three statuses a specialist may report against `/specialists/done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedStatus {
    Passed,
    Failed,
    Blocked,
}

impl ReportedStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "passed" => Some(ReportedStatus::Passed),
            "failed" => Some(ReportedStatus::Failed),
            "blocked" => Some(ReportedStatus::Blocked),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ReportedStatus::Passed => "passed",
            ReportedStatus::Failed => "failed",
            ReportedStatus::Blocked => "blocked",
        }
    }
}

pub struct PipelineController<A: AgentAdapter, S: SessionAdapter, C: Clock, T: IssueTracker, B: BranchPusher, I: IdGen> {
    reviews: ReviewStatusStore,
    specialists: SpecialistRegistry<S, C>,
    workers: WorkerSupervisor<A, C>,
    issue_tracker: T,
    branch_pusher: B,
    id_gen: I,
    clock: C,
    #[allow(dead_code)]
    lock: GlobalMutationLock,
}

impl<A: AgentAdapter, S: SessionAdapter, C: Clock, T: IssueTracker, B: BranchPusher, I: IdGen>
    PipelineController<A, S, C, T, B, I>
{
    pub fn new(
        reviews: ReviewStatusStore,
        specialists: SpecialistRegistry<S, C>,
        workers: WorkerSupervisor<A, C>,
        issue_tracker: T,
        branch_pusher: B,
        id_gen: I,
        clock: C,
        lock: GlobalMutationLock,
    ) -> Self {
        Self {
            reviews,
            specialists,
            workers,
            issue_tracker,
            branch_pusher,
            id_gen,
            clock,
            lock,
        }
    }

    pub fn status(&self, issue_id: &IssueId) -> Option<ReviewStatus> {
        self.reviews.get(issue_id)
    }

    /// Every tracked issue's review status, for the control surface's
    /// workspace listing.
    pub fn all_statuses(&self) -> std::collections::HashMap<IssueId, ReviewStatus> {
        self.reviews.all()
    }

    /// Human-initiated `/workspaces/:issueId/review`.
    pub async fn start_review(
        &self,
        issue_id: &IssueId,
        branch: Option<&str>,
    ) -> EngineResult<StartReviewOutcome> {
        let now = self.clock.epoch_ms();
        let mut refusal = None;
        self.reviews
            .merge(issue_id, |current| {
                let mut status = current.unwrap_or_else(|| ReviewStatus::fresh(now));
                if let Err(AlreadyReviewedNeedsAction { review_notes }) = status.start_review(now) {
                    refusal = Some(review_notes);
                }
                status
            })
            .map_err(storage_err)?;
        if let Some(review_notes) = refusal {
            return Err(EngineError::AlreadyReviewedNeedsAction(review_notes));
        }

        let workspace_path = self.workspace_for(issue_id)?;
        let branch = branch.map(str::to_string).unwrap_or_else(|| default_branch(issue_id));

        if let Err(e) = self.branch_pusher.push(&workspace_path, &branch).await {
            tracing::warn!(%issue_id, error = %e, "best-effort branch push failed");
        }

        let item = work_item(
            self.id_gen.next(),
            issue_id.clone(),
            workspace_path,
            Some(branch),
            Priority::Normal,
            "review-start",
            now,
        );
        match self.specialists.wake_or_queue(SpecialistName::ReviewAgent, item).await? {
            WakeOutcome::Woke => Ok(StartReviewOutcome::Started),
            WakeOutcome::Queued => Ok(StartReviewOutcome::Queued),
        }
    }

    /// `POST /specialists/done`: a specialist reports the result of the
    /// issue it was just working on.
    pub async fn report_status(
        &self,
        specialist: SpecialistName,
        issue_id: &IssueId,
        status: ReportedStatus,
        notes: &str,
    ) -> EngineResult<()> {
        let now = self.clock.epoch_ms();
        let mut requeue_review = false;

        self.reviews
            .merge(issue_id, |current| {
                let mut s = current.unwrap_or_else(|| ReviewStatus::fresh(now));
                match (specialist, status) {
                    (SpecialistName::ReviewAgent, ReportedStatus::Passed) => {
                        s.review_passed(now);
                    }
                    (SpecialistName::ReviewAgent, ReportedStatus::Blocked | ReportedStatus::Failed) => {
                        s.review_blocked_or_failed(status == ReportedStatus::Failed, notes.to_string(), now);
                    }
                    (SpecialistName::TestAgent, ReportedStatus::Passed) => {
                        s.test_passed(now);
                    }
                    (SpecialistName::TestAgent, ReportedStatus::Failed | ReportedStatus::Blocked) => {
                        requeue_review = s.test_failed(notes.to_string(), now);
                    }
                    (SpecialistName::MergeAgent, ReportedStatus::Passed) => {
                        s.merged(now);
                    }
                    (SpecialistName::MergeAgent, ReportedStatus::Failed | ReportedStatus::Blocked) => {
                        s.merge_failed(now);
                    }
                }
                s
            })
            .map_err(storage_err)?;

        self.deliver_feedback_best_effort(specialist, issue_id, status, notes).await;
        self.update_upstream_best_effort(specialist, issue_id, status).await;

        match (specialist, status) {
            (SpecialistName::ReviewAgent, ReportedStatus::Passed) => {
                self.enqueue_next(SpecialistName::TestAgent, issue_id, Priority::High, "review-passed")
                    .await?;
            }
            (SpecialistName::TestAgent, ReportedStatus::Failed | ReportedStatus::Blocked) if requeue_review => {
                self.enqueue_next(SpecialistName::ReviewAgent, issue_id, Priority::Normal, "test-failed-requeue")
                    .await?;
            }
            _ => {}
        }

        self.specialists
            .report_completion(specialist, issue_id, status.as_str(), notes)
            .await
    }

    async fn enqueue_next(
        &self,
        name: SpecialistName,
        issue_id: &IssueId,
        priority: Priority,
        source: &str,
    ) -> EngineResult<()> {
        let workspace_path = self.workspace_for(issue_id)?;
        let now = self.clock.epoch_ms();
        let item = work_item(self.id_gen.next(), issue_id.clone(), workspace_path, None, priority, source, now);
        self.specialists.wake_or_queue(name, item).await?;
        Ok(())
    }

    /// Auto-feedback delivery: best-effort, opportunistic. A missing
    /// or dead worker session is not an error — the notes are already
    /// durable in the `ReviewStatus` record.
    async fn deliver_feedback_best_effort(
        &self,
        specialist: SpecialistName,
        issue_id: &IssueId,
        status: ReportedStatus,
        notes: &str,
    ) {
        if notes.is_empty() {
            return;
        }
        let Ok(Some(record)) = self.workers.record(issue_id) else {
            return;
        };
        let guidance = match (specialist, status) {
            (_, ReportedStatus::Passed) => "No action needed.",
            (SpecialistName::ReviewAgent, _) => {
                "Address the feedback above, then request another review."
            }
            (SpecialistName::TestAgent, _) => "Fix the failing tests above; a re-review will follow automatically.",
            (SpecialistName::MergeAgent, _) => "Resolve the merge issue above and request another review.",
        };
        let message = format!(
            "{} {} for {issue_id}:\n\n{notes}\n\n{guidance}",
            specialist.as_str(),
            status.as_str(),
        );
        if let Err(e) = self.workers.send_message(&record.id, &message).await {
            tracing::warn!(%issue_id, error = %e, "best-effort feedback delivery failed");
        }
    }

    async fn update_upstream_best_effort(
        &self,
        specialist: SpecialistName,
        issue_id: &IssueId,
        status: ReportedStatus,
    ) {
        let result = match (specialist, status) {
            (SpecialistName::ReviewAgent, ReportedStatus::Passed) => {
                self.issue_tracker.set_state(issue_id, "In Review").await
            }
            (SpecialistName::MergeAgent, ReportedStatus::Passed) => self.issue_tracker.close(issue_id).await,
            _ => return,
        };
        if let Err(e) = result {
            tracing::warn!(%issue_id, error = %e, "best-effort upstream tracker update failed");
        }
    }

    fn workspace_for(&self, issue_id: &IssueId) -> EngineResult<PathBuf> {
        self.workers
            .record(issue_id)?
            .map(|r| r.workspace_path)
            .ok_or_else(|| EngineError::not_found(format!("worker agent for issue {issue_id}")))
    }
}

fn default_branch(issue_id: &IssueId) -> String {
    format!("issue/{}", issue_id.as_str().to_lowercase())
}

#[allow(clippy::too_many_arguments)]
fn work_item(
    id: String,
    issue_id: IssueId,
    workspace: PathBuf,
    branch: Option<String>,
    priority: Priority,
    source: &str,
    now_ms: u64,
) -> WorkItem {
    WorkItem {
        id: WorkItemId::new(id),
        kind: WorkItemKind::Task,
        priority,
        source: source.to_string(),
        payload: WorkItemPayload {
            issue_id,
            workspace,
            workspace_id: None,
            branch,
            custom_prompt: None,
        },
        created_at_ms: now_ms,
        expires_at_ms: None,
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
