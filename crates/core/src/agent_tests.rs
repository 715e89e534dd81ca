// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_agent_record_starts_with_zeroed_counters() {
    let record = AgentRecord::new(
        AgentId::new("agent-pan-1"),
        IssueId::new("PAN-1"),
        PathBuf::from("/tmp/ws"),
        "claude-code",
        "claude-opus",
        1_000,
    );
    assert_eq!(record.consecutive_failures, 0);
    assert_eq!(record.kill_count, 0);
    assert!(record.session_token.is_none());
}

#[test]
fn runtime_state_other_round_trips_display() {
    let state = WorkerRuntimeState::Other("compacting".into());
    assert_eq!(state.to_string(), "compacting");
}

#[test]
fn runtime_record_default_is_working_with_no_activity() {
    let record = RuntimeRecord::default();
    assert_eq!(record.state, WorkerRuntimeState::Working);
    assert!(record.last_activity_ms.is_none());
}

#[yare::parameterized(
    hidden = { HealthStatus::Hidden, "hidden" },
    dead = { HealthStatus::Dead, "dead" },
    stuck = { HealthStatus::Stuck, "stuck" },
    active = { HealthStatus::Active, "active" },
)]
fn health_status_display(status: HealthStatus, expected: &str) {
    assert_eq!(status.to_string(), expected);
}

#[test]
fn default_thresholds_are_strictly_increasing() {
    let t = HealthThresholds::default();
    assert!(t.stale < t.warn);
    assert!(t.warn < t.stuck);
}
