// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health Classifier: a pure function of session liveness, heartbeat
//! recency, terminal-pane stability, and runtime state. No I/O — callers
//! (the patrol loop, the `GET /agents` handler) gather session liveness,
//! `runtime.json`, and a rolling pane-hash digest, then hand them here.

use panopticon_core::{HealthStatus, HealthThresholds, WorkerRuntimeState};

/// Everything the classifier needs to know about one worker agent at the
/// instant of classification.
#[derive(Debug, Clone)]
pub struct HealthInputs {
    /// Whether the Session Driver reports a live session for this agent.
    pub session_alive: bool,
    /// Whether a state directory exists at all — does not imply liveness.
    pub has_state_dir: bool,
    /// Most recently reported runtime state (`runtime.json.state`).
    pub runtime_state: WorkerRuntimeState,
    /// Timestamp of the most recent hook heartbeat, if any has been seen.
    pub last_heartbeat_ms: Option<u64>,
    /// Timestamp at which the terminal pane's rolling hash last changed.
    /// `None` means no capture has ever differed from the last, i.e. the
    /// pane has been stable since the session started.
    pub last_pane_change_ms: Option<u64>,
}

/// Maps the classifier inputs to a [`HealthStatus`], applying the rules in
/// spec order — the first matching rule wins.
pub fn classify(inputs: &HealthInputs, thresholds: &HealthThresholds, now_ms: u64) -> HealthStatus {
    // Rule 1/2: no live session is authoritative regardless of stored state.
    if !inputs.session_alive {
        return if inputs.has_state_dir {
            HealthStatus::Dead
        } else {
            HealthStatus::Hidden
        };
    }

    // Rule 3: an explicit suspended runtime state overrides pane staleness.
    if inputs.runtime_state == WorkerRuntimeState::Suspended {
        return HealthStatus::Suspended;
    }

    let pane_stable_ms = elapsed_ms(inputs.last_pane_change_ms, now_ms);
    let heartbeat_stale_ms = elapsed_ms(inputs.last_heartbeat_ms, now_ms);

    if pane_stable_ms >= thresholds.stuck.as_millis() as u64
        && heartbeat_stale_ms >= thresholds.stuck.as_millis() as u64
    {
        return HealthStatus::Stuck;
    }
    if pane_stable_ms >= thresholds.warn.as_millis() as u64 {
        return HealthStatus::Warning;
    }
    if pane_stable_ms >= thresholds.stale.as_millis() as u64 {
        return HealthStatus::Stale;
    }
    HealthStatus::Active
}

/// Milliseconds elapsed since `ts_ms`, or `u64::MAX` when no timestamp has
/// ever been recorded — treated as "infinitely stale" so every threshold
/// rule still fires correctly for an agent with no evidence yet.
fn elapsed_ms(ts_ms: Option<u64>, now_ms: u64) -> u64 {
    match ts_ms {
        Some(ts) => now_ms.saturating_sub(ts),
        None => u64::MAX,
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
