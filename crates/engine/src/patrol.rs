// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Patrol Loop: a periodic reconciler owned by the daemon. Every tick
//! is pure reconciliation — it only ever performs actions that would also
//! be valid if invoked directly through the control surface. It never kills
//! a live agent, and starting or stopping the loop has no side effect of
//! its own.

use crate::convert::storage_err;
use crate::specialists::SpecialistRegistry;
use panopticon_adapters::session::SessionAdapter;
use panopticon_core::{
    AgentId, Clock, EngineResult, HealthRecord, HealthThresholds, IssueId, OperationRecord,
    SpecialistName,
};
use panopticon_storage::{AgentStore, OperationJournal};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

/// Summary of one tick, returned so callers (the daemon's scheduling task,
/// tests) can log or assert on what happened without re-deriving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatrolReport {
    pub agents_classified: usize,
    pub specialists_woken: Vec<(SpecialistName, IssueId)>,
    pub queue_items_expired: usize,
    pub operations_timed_out: usize,
}

/// Tracks, per worker agent, the last captured pane digest and when it last
/// changed — in-memory only, since it's meaningful only across ticks of the
/// same running daemon and is never read back by anything else.
struct PaneTrack {
    digest: u64,
    changed_at_ms: u64,
}

pub struct PatrolLoop<S: SessionAdapter, C: Clock> {
    agents: AgentStore,
    sessions: S,
    specialists: SpecialistRegistry<S, C>,
    journal: OperationJournal,
    clock: C,
    thresholds: HealthThresholds,
    operation_ceiling_ms: u64,
    panes: Mutex<HashMap<AgentId, PaneTrack>>,
}

impl<S: SessionAdapter, C: Clock> PatrolLoop<S, C> {
    pub fn new(
        agents: AgentStore,
        sessions: S,
        specialists: SpecialistRegistry<S, C>,
        journal: OperationJournal,
        clock: C,
        thresholds: HealthThresholds,
        operation_ceiling: Duration,
    ) -> Self {
        Self {
            agents,
            sessions,
            specialists,
            journal,
            clock,
            thresholds,
            operation_ceiling_ms: operation_ceiling.as_millis() as u64,
            panes: Mutex::new(HashMap::new()),
        }
    }

    /// Run one complete tick. Steps run in spec order; a failure in one
    /// worker's classification or one specialist's wake does not abort the
    /// rest of the tick — each step is independently best-effort so one bad
    /// agent can't starve the others of reconciliation.
    pub async fn tick(&self) -> EngineResult<PatrolReport> {
        let mut report = PatrolReport::default();

        report.agents_classified = self.classify_workers().await;
        report.specialists_woken = self.wake_idle_specialists().await?;
        report.queue_items_expired = self.expire_queues()?;
        report.operations_timed_out = self.expire_stale_operations()?;

        Ok(report)
    }

    /// Current contents of the Operation Journal, for the control
    /// surface's in-flight-operations listing.
    pub fn operations(&self) -> Vec<OperationRecord> {
        self.journal.list()
    }

    /// Step 1: enumerate live sessions and state directories; classify and
    /// persist health for every worker agent with durable state.
    async fn classify_workers(&self) -> usize {
        let agent_ids = match self.agents.list_agent_ids() {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "patrol: failed to list agent ids");
                return 0;
            }
        };

        let mut classified = 0;
        for agent_id in agent_ids {
            if self.classify_one(&agent_id).await.is_some() {
                classified += 1;
            }
        }
        classified
    }

    async fn classify_one(&self, agent_id: &AgentId) -> Option<()> {
        let tmux_id = worker_session_id(agent_id);
        let session_alive = match self.sessions.is_alive(&tmux_id).await {
            Ok(alive) => alive,
            Err(e) => {
                tracing::warn!(%agent_id, error = %e, "patrol: liveness check failed, skipping");
                return None;
            }
        };

        let runtime = match self.agents.load_runtime(agent_id) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(%agent_id, error = %e, "patrol: failed to load runtime, skipping");
                return None;
            }
        };

        let now = self.clock.epoch_ms();
        let last_pane_change_ms = if session_alive {
            self.track_pane(agent_id, &tmux_id, now).await
        } else {
            None
        };

        let inputs = crate::health::HealthInputs {
            session_alive,
            has_state_dir: true,
            runtime_state: runtime.state,
            last_heartbeat_ms: runtime.last_activity_ms,
            last_pane_change_ms,
        };
        let status = crate::health::classify(&inputs, &self.thresholds, now);

        if let Err(e) = self.agents.save_health(
            agent_id,
            &HealthRecord {
                status,
                computed_at_ms: now,
            },
        ) {
            tracing::warn!(%agent_id, error = %e, "patrol: failed to persist health classification");
            return None;
        }

        Some(())
    }

    /// Captures the pane, hashes it, and returns the timestamp the digest
    /// last differed from the previous capture — `None` only when the
    /// capture itself failed, in which case staleness tracking degrades to
    /// "never seen" for this tick (health.rs treats that as infinitely
    /// stale, which is the conservative direction for a capture failure).
    async fn track_pane(&self, agent_id: &AgentId, tmux_id: &str, now_ms: u64) -> Option<u64> {
        let output = self.sessions.capture_output(tmux_id, 200).await.ok()?;
        let digest = hash_str(&output);

        let mut panes = self.panes.lock();
        let changed_at_ms = match panes.get_mut(agent_id) {
            Some(track) if track.digest == digest => track.changed_at_ms,
            Some(track) => {
                track.digest = digest;
                track.changed_at_ms = now_ms;
                now_ms
            }
            None => {
                panes.insert(
                    agent_id.clone(),
                    PaneTrack {
                        digest,
                        changed_at_ms: now_ms,
                    },
                );
                now_ms
            }
        };
        Some(changed_at_ms)
    }

    /// Step 2: for each specialist that is idle with a non-empty queue, pop
    /// the next item and wake it. Only the `Idle` state is patrol-eligible —
    /// `Uninitialized` is handled by whatever first calls `wake_or_queue`
    /// for that specialist, and `Suspended` requires an explicit `resume`
    /// (patrol never supplies the session token that needs).
    async fn wake_idle_specialists(&self) -> EngineResult<Vec<(SpecialistName, IssueId)>> {
        let mut woken = Vec::new();
        for name in SpecialistName::ALL {
            let record = self.specialists.record(name)?;
            if record.state != panopticon_core::SpecialistRuntimeState::Idle {
                continue;
            }
            let Some(item) = self.specialists.dequeue(name)? else {
                continue;
            };
            let issue_id = item.payload.issue_id.clone();
            match self.specialists.wake_with_task(name, &item).await {
                Ok(()) => woken.push((name, issue_id)),
                Err(e) => {
                    tracing::warn!(%name, %issue_id, error = %e, "patrol: failed to wake idle specialist, re-queueing");
                    self.specialists.enqueue(name, item)?;
                }
            }
        }
        Ok(woken)
    }

    /// Step 4: drop expired queue entries across every specialist.
    fn expire_queues(&self) -> EngineResult<usize> {
        let mut total = 0;
        for name in SpecialistName::ALL {
            total += self.specialists.expire(name)?.len();
        }
        Ok(total)
    }

    /// Step 5: rewrite any `running` journal entry older than the
    /// operation ceiling to `failed` with "Operation timed out".
    fn expire_stale_operations(&self) -> EngineResult<usize> {
        let now = self.clock.epoch_ms();
        let timed_out: Vec<OperationRecord> = self
            .journal
            .expire_stale(now, self.operation_ceiling_ms)
            .map_err(storage_err)?;
        Ok(timed_out.len())
    }
}

/// Worker agents don't expose a `SessionAdapter` through the
/// `WorkerSupervisor`/`AgentAdapter` boundary, so patrol derives the same
/// deterministic tmux session id independently — matching the format
/// `WorkerSupervisor`'s own private helper and the Pending-Question Broker
/// both already compute from an agent id.
fn worker_session_id(agent_id: &AgentId) -> String {
    format!("pano-{}", agent_id.as_str())
}

fn hash_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
#[path = "patrol_tests.rs"]
mod tests;
