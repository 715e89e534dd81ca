// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use panopticon_adapters::session::FakeSessionAdapter;
use panopticon_core::{FakeClock, IssueId, Priority, WorkItemKind, WorkItemPayload};
use panopticon_storage::SpecialistStore;
use std::path::PathBuf;

type TestRegistry = SpecialistRegistry<FakeSessionAdapter, FakeClock>;

fn registry() -> (tempfile::TempDir, TestRegistry, FakeSessionAdapter) {
    let dir = tempfile::tempdir().unwrap();
    let store = SpecialistStore::new(dir.path().join("specialists"));
    let sessions = FakeSessionAdapter::new();
    let reg = SpecialistRegistry::new(
        store,
        sessions.clone(),
        GlobalMutationLock::new(),
        FakeClock::default(),
        SpecialistCommand::defaults(),
    );
    (dir, reg, sessions)
}

fn item(issue: &str) -> WorkItem {
    WorkItem {
        id: WorkItemId::new(format!("wi-{issue}")),
        kind: WorkItemKind::Task,
        priority: Priority::Normal,
        source: "test".to_string(),
        payload: WorkItemPayload {
            issue_id: IssueId::new(issue),
            workspace: PathBuf::from(format!("/tmp/ws-{issue}")),
            workspace_id: None,
            branch: Some(format!("issue/{issue}")),
            custom_prompt: None,
        },
        created_at_ms: 0,
        expires_at_ms: None,
    }
}

#[tokio::test]
async fn wake_with_task_spawns_and_sends_prompt_to_the_same_session_id() {
    let (_dir, reg, sessions) = registry();
    reg.wake_with_task(SpecialistName::ReviewAgent, &item("PAN-1")).await.unwrap();

    let calls = sessions.calls();
    let spawned_name = calls.iter().find_map(|c| match c {
        panopticon_adapters::session::SessionCall::Spawn { name, .. } => Some(name.clone()),
        _ => None,
    });
    assert_eq!(spawned_name.as_deref(), Some("specialist-review-agent"));

    let sent_to = calls.iter().find_map(|c| match c {
        panopticon_adapters::session::SessionCall::Send { id, .. } => Some(id.clone()),
        _ => None,
    });
    let sent_to = sent_to.expect("wake_with_task must send the prompt");
    assert!(
        sessions.get_session(&sent_to).is_some(),
        "send must target the session spawn() created, not a precomputed id"
    );

    let record = reg.record(SpecialistName::ReviewAgent).unwrap();
    assert_eq!(record.state, SpecialistRuntimeState::Active);
    assert_eq!(record.current_issue, Some(IssueId::new("PAN-1")));
}

#[tokio::test]
async fn wake_with_task_refuses_when_already_active() {
    let (_dir, reg, _sessions) = registry();
    reg.wake_with_task(SpecialistName::ReviewAgent, &item("PAN-1")).await.unwrap();

    let err = reg.wake_with_task(SpecialistName::ReviewAgent, &item("PAN-2")).await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyRunning(_)));
}

#[tokio::test]
async fn wake_or_queue_enqueues_when_busy() {
    let (_dir, reg, _sessions) = registry();
    let first = reg.wake_or_queue(SpecialistName::ReviewAgent, item("PAN-1")).await.unwrap();
    assert_eq!(first, WakeOutcome::Woke);

    let second = reg.wake_or_queue(SpecialistName::ReviewAgent, item("PAN-2")).await.unwrap();
    assert_eq!(second, WakeOutcome::Queued);

    let queued = reg.list(SpecialistName::ReviewAgent).unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].payload.issue_id, IssueId::new("PAN-2"));
}

#[tokio::test]
async fn suspend_then_resume_reattaches_with_stored_token() {
    let (_dir, reg, sessions) = registry();
    reg.wake_with_task(SpecialistName::ReviewAgent, &item("PAN-1")).await.unwrap();
    reg.record_session_token(SpecialistName::ReviewAgent, "tok-123").unwrap();

    reg.suspend(SpecialistName::ReviewAgent).await.unwrap();
    assert_eq!(
        reg.record(SpecialistName::ReviewAgent).unwrap().state,
        SpecialistRuntimeState::Suspended
    );

    reg.resume(SpecialistName::ReviewAgent, Some("keep going")).await.unwrap();
    assert_eq!(
        reg.record(SpecialistName::ReviewAgent).unwrap().state,
        SpecialistRuntimeState::Active
    );

    let sent = sessions.calls();
    assert!(sent.iter().any(|c| matches!(
        c,
        panopticon_adapters::session::SessionCall::Send { input, .. } if input == "keep going"
    )));
}

#[tokio::test]
async fn report_completion_wakes_next_queued_item_immediately() {
    let (_dir, reg, _sessions) = registry();
    reg.wake_or_queue(SpecialistName::ReviewAgent, item("PAN-1")).await.unwrap();
    reg.wake_or_queue(SpecialistName::ReviewAgent, item("PAN-2")).await.unwrap();
    assert_eq!(reg.list(SpecialistName::ReviewAgent).unwrap().len(), 1);

    reg.report_completion(SpecialistName::ReviewAgent, &IssueId::new("PAN-1"), "passed", "")
        .await
        .unwrap();

    let record = reg.record(SpecialistName::ReviewAgent).unwrap();
    assert_eq!(record.state, SpecialistRuntimeState::Active);
    assert_eq!(record.current_issue, Some(IssueId::new("PAN-2")));
    assert!(reg.list(SpecialistName::ReviewAgent).unwrap().is_empty());
}

#[tokio::test]
async fn reorder_round_trips_queue_order() {
    let (_dir, reg, _sessions) = registry();
    reg.enqueue(SpecialistName::TestAgent, item("PAN-1")).unwrap();
    reg.enqueue(SpecialistName::TestAgent, item("PAN-2")).unwrap();
    reg.enqueue(SpecialistName::TestAgent, item("PAN-3")).unwrap();

    let ids: Vec<WorkItemId> = reg
        .list(SpecialistName::TestAgent)
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .rev()
        .collect();
    reg.reorder(SpecialistName::TestAgent, &ids).unwrap();

    let after: Vec<WorkItemId> = reg.list(SpecialistName::TestAgent).unwrap().into_iter().map(|i| i.id).collect();
    assert_eq!(after, ids);
}
