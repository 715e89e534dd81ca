// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lifecycle::Daemon;
use panopticon_config::PanopticonPaths;
use tempfile::TempDir;

fn test_ctx() -> (TempDir, ListenCtx) {
    let dir = TempDir::new().unwrap();
    let paths = PanopticonPaths::with_root(dir.path());
    let daemon = Arc::new(Daemon::startup(paths).unwrap());
    (
        dir,
        ListenCtx {
            daemon,
            shutdown: Arc::new(Notify::new()),
        },
    )
}

#[tokio::test]
async fn ping_replies_pong() {
    let (_dir, ctx) = test_ctx();
    let response = handle_request(&ctx, Request::Ping).await;
    assert_eq!(response, Response::Pong);
}

#[tokio::test]
async fn agent_list_on_a_fresh_daemon_is_empty() {
    let (_dir, ctx) = test_ctx();
    let response = handle_request(&ctx, Request::AgentList).await;
    assert_eq!(response, Response::Agents(vec![]));
}

#[tokio::test]
async fn specialist_list_reports_all_three_specialists_uninitialized() {
    let (_dir, ctx) = test_ctx();
    let response = handle_request(&ctx, Request::SpecialistList).await;
    match response {
        Response::Specialists(records) => assert_eq!(records.len(), 3),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn review_status_all_on_a_fresh_daemon_is_empty() {
    let (_dir, ctx) = test_ctx();
    let response = handle_request(&ctx, Request::ReviewStatusAll).await;
    assert_eq!(response, Response::ReviewStatuses(Default::default()));
}

#[tokio::test]
async fn operations_list_on_a_fresh_daemon_is_empty() {
    let (_dir, ctx) = test_ctx();
    let response = handle_request(&ctx, Request::OperationsList).await;
    assert_eq!(response, Response::Operations(vec![]));
}

#[tokio::test]
async fn specialist_queue_push_then_list_round_trips() {
    let (_dir, ctx) = test_ctx();
    let push = Request::SpecialistQueuePush {
        name: SpecialistName::ReviewAgent,
        issue_id: "PAN-1".to_string(),
        workspace_path: std::path::PathBuf::from("/tmp/ws"),
        branch: None,
        custom_prompt: None,
        priority: Priority::Normal,
    };
    assert_eq!(handle_request(&ctx, push).await, Response::Ok);

    let list = handle_request(
        &ctx,
        Request::SpecialistQueueList {
            name: SpecialistName::ReviewAgent,
        },
    )
    .await;
    match list {
        Response::Queue(items) => assert_eq!(items.len(), 1),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_specialist_done_status_is_rejected() {
    let (_dir, ctx) = test_ctx();
    let response = handle_request(
        &ctx,
        Request::SpecialistDone {
            name: SpecialistName::TestAgent,
            issue_id: "PAN-1".to_string(),
            status: "bogus".to_string(),
            notes: String::new(),
        },
    )
    .await;
    assert!(matches!(response, Response::Error { .. }));
}