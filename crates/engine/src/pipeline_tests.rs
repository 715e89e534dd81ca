// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lock::GlobalMutationLock;
use crate::workers::WorkerSupervisor;
use panopticon_adapters::agent::FakeAgentAdapter;
use panopticon_adapters::session::FakeSessionAdapter;
use panopticon_adapters::upstream::{FakeBranchPusher, FakeIssueTracker, UpstreamCall};
use panopticon_config::SpecialistCommand;
use panopticon_core::{FakeClock, SequentialIdGen};
use panopticon_storage::{AgentStore, ReviewStatusStore, SpecialistStore};

type TestPipeline = PipelineController<
    FakeAgentAdapter,
    FakeSessionAdapter,
    FakeClock,
    FakeIssueTracker,
    FakeBranchPusher,
    SequentialIdGen,
>;

struct Harness {
    _dir: tempfile::TempDir,
    pipeline: TestPipeline,
    agents: FakeAgentAdapter,
    sessions: FakeSessionAdapter,
    issue_tracker: FakeIssueTracker,
    branch_pusher: FakeBranchPusher,
    workers: WorkerSupervisor<FakeAgentAdapter, FakeClock>,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let agent_store = AgentStore::new(dir.path().join("agents"));
    let specialist_store = SpecialistStore::new(dir.path().join("specialists"));
    let reviews = ReviewStatusStore::open(dir.path().join("review-status.json")).unwrap();

    let agents = FakeAgentAdapter::new();
    let sessions = FakeSessionAdapter::new();
    let issue_tracker = FakeIssueTracker::new();
    let branch_pusher = FakeBranchPusher::new();
    let clock = FakeClock::default();
    let lock = GlobalMutationLock::new();

    let workers = WorkerSupervisor::new(
        agent_store,
        agents.clone(),
        lock.clone(),
        clock.clone(),
        panopticon_config::WorkerCommand::default(),
        100,
    );
    let specialists = SpecialistRegistry::new(
        specialist_store,
        sessions.clone(),
        lock.clone(),
        clock.clone(),
        SpecialistCommand::defaults(),
    );
    let pipeline = PipelineController::new(
        reviews,
        specialists,
        WorkerSupervisor::new(
            AgentStore::new(dir.path().join("agents")),
            agents.clone(),
            lock.clone(),
            clock.clone(),
            panopticon_config::WorkerCommand::default(),
            100,
        ),
        issue_tracker.clone(),
        branch_pusher.clone(),
        SequentialIdGen::new("wi"),
        clock.clone(),
        lock.clone(),
    );

    Harness {
        _dir: dir,
        pipeline,
        agents,
        sessions,
        issue_tracker,
        branch_pusher,
        workers,
    }
}

#[tokio::test]
async fn start_review_on_fresh_issue_wakes_review_agent() {
    let h = harness();
    let issue = IssueId::new("PAN-100");
    h.workers
        .spawn(issue.clone(), PathBuf::from("/tmp/ws-pan-100"), "claude-code", "sonnet")
        .await
        .unwrap();

    let outcome = h.pipeline.start_review(&issue, Some("feature/pan-100")).await.unwrap();
    assert_eq!(outcome, StartReviewOutcome::Started);

    let status = h.pipeline.status(&issue).unwrap();
    assert_eq!(status.review_status, panopticon_core::ReviewState::Reviewing);

    let pushes = h.branch_pusher.calls();
    assert_eq!(pushes.len(), 1);
    assert!(matches!(&pushes[0], UpstreamCall::Push { branch, .. } if branch == "feature/pan-100"));
}

#[tokio::test]
async fn start_review_refuses_when_blocked_with_unread_notes() {
    let h = harness();
    let issue = IssueId::new("PAN-101");
    h.workers
        .spawn(issue.clone(), PathBuf::from("/tmp/ws-pan-101"), "claude-code", "sonnet")
        .await
        .unwrap();

    h.pipeline.start_review(&issue, None).await.unwrap();
    h.pipeline
        .report_status(SpecialistName::ReviewAgent, &issue, ReportedStatus::Blocked, "fix the thing")
        .await
        .unwrap();

    let err = h.pipeline.start_review(&issue, None).await.unwrap_err();
    match err {
        EngineError::AlreadyReviewedNeedsAction(notes) => assert_eq!(notes, "fix the thing"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn review_passed_wakes_test_agent_and_updates_tracker() {
    let h = harness();
    let issue = IssueId::new("PAN-102");
    h.workers
        .spawn(issue.clone(), PathBuf::from("/tmp/ws-pan-102"), "claude-code", "sonnet")
        .await
        .unwrap();
    h.pipeline.start_review(&issue, None).await.unwrap();

    h.pipeline
        .report_status(SpecialistName::ReviewAgent, &issue, ReportedStatus::Passed, "")
        .await
        .unwrap();

    let status = h.pipeline.status(&issue).unwrap();
    assert_eq!(status.review_status, panopticon_core::ReviewState::Passed);

    let tracker_calls = h.issue_tracker.calls();
    assert!(tracker_calls.iter().any(|c| matches!(
        c,
        UpstreamCall::SetState { state, .. } if state == "In Review"
    )));

    // test-agent should have been woken (or at least enqueued) for the
    // same issue at high priority.
    let queued = h.sessions.calls();
    assert!(!queued.is_empty());
}

#[tokio::test]
async fn test_failure_auto_requeues_until_circuit_breaker_trips() {
    let h = harness();
    let issue = IssueId::new("PAN-103");
    h.workers
        .spawn(issue.clone(), PathBuf::from("/tmp/ws-pan-103"), "claude-code", "sonnet")
        .await
        .unwrap();
    h.pipeline.start_review(&issue, None).await.unwrap();

    for expected in 1..=panopticon_core::AUTO_REQUEUE_LIMIT {
        h.pipeline
            .report_status(SpecialistName::TestAgent, &issue, ReportedStatus::Failed, "flaky test")
            .await
            .unwrap();
        let status = h.pipeline.status(&issue).unwrap();
        assert_eq!(status.auto_requeue_count, expected);
    }

    // One more failure beyond the limit must not increment further.
    h.pipeline
        .report_status(SpecialistName::TestAgent, &issue, ReportedStatus::Failed, "still flaky")
        .await
        .unwrap();
    let status = h.pipeline.status(&issue).unwrap();
    assert_eq!(status.auto_requeue_count, panopticon_core::AUTO_REQUEUE_LIMIT);
}

#[tokio::test]
async fn merge_passed_closes_upstream_issue_and_clears_ready_for_merge() {
    let h = harness();
    let issue = IssueId::new("PAN-104");
    h.workers
        .spawn(issue.clone(), PathBuf::from("/tmp/ws-pan-104"), "claude-code", "sonnet")
        .await
        .unwrap();
    h.pipeline.start_review(&issue, None).await.unwrap();
    h.pipeline
        .report_status(SpecialistName::ReviewAgent, &issue, ReportedStatus::Passed, "")
        .await
        .unwrap();
    h.pipeline
        .report_status(SpecialistName::TestAgent, &issue, ReportedStatus::Passed, "")
        .await
        .unwrap();
    let status = h.pipeline.status(&issue).unwrap();
    assert!(status.ready_for_merge);

    h.pipeline
        .report_status(SpecialistName::MergeAgent, &issue, ReportedStatus::Passed, "")
        .await
        .unwrap();

    let status = h.pipeline.status(&issue).unwrap();
    assert_eq!(status.merge_status, Some(panopticon_core::MergeState::Merged));
    assert!(!status.ready_for_merge);
    assert!(h
        .issue_tracker
        .calls()
        .iter()
        .any(|c| matches!(c, UpstreamCall::Close { issue: i } if i == &issue)));
}

#[tokio::test]
async fn review_feedback_is_delivered_to_live_worker() {
    let h = harness();
    let issue = IssueId::new("PAN-105");
    let record = h
        .workers
        .spawn(issue.clone(), PathBuf::from("/tmp/ws-pan-105"), "claude-code", "sonnet")
        .await
        .unwrap();
    h.pipeline.start_review(&issue, None).await.unwrap();

    h.pipeline
        .report_status(SpecialistName::ReviewAgent, &issue, ReportedStatus::Failed, "missing tests")
        .await
        .unwrap();

    let sent = h.agents.calls();
    let delivered = sent.iter().any(|c| matches!(
        c,
        panopticon_adapters::agent::AgentCall::Send { agent_id, input }
            if agent_id == &record.id && input.contains("missing tests")
    ));
    assert!(delivered, "expected feedback message sent to worker agent");
}
