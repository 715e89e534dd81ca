// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Specialist Registry: singleton lifecycle, per-name priority queue,
//! and the sleep/wake/suspend/resume dance driven through the Session
//! Driver and serialized against the upstream provider by the Global
//! Mutation Lock.

use crate::convert::{session_err, storage_err};
use crate::lock::GlobalMutationLock;
use panopticon_adapters::session::SessionAdapter;
use panopticon_config::SpecialistCommand;
use panopticon_core::{
    Clock, EngineError, EngineResult, IssueId, SpecialistName, SpecialistRecord,
    SpecialistRuntimeState, WorkItem, WorkItemId,
};
use panopticon_storage::{IssueStatusNote, SpecialistStore};
use std::collections::HashMap;

/// Outcome of [`SpecialistRegistry::wake_or_queue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeOutcome {
    Woke,
    Queued,
}

#[derive(Clone)]
pub struct SpecialistRegistry<S: SessionAdapter, C: Clock> {
    store: SpecialistStore,
    sessions: S,
    lock: GlobalMutationLock,
    clock: C,
    commands: HashMap<SpecialistName, SpecialistCommand>,
}

/// Logical session name handed to `SessionAdapter::spawn`; the adapter
/// derives the actual session id by prefixing it (see `session_id_for`).
fn specialist_session_name(name: SpecialistName) -> String {
    format!("specialist-{}", name.as_str())
}

/// The tmux session id `TmuxAdapter::spawn` derives from
/// `specialist_session_name`, so the registry can check liveness before
/// `spawn` has run.
fn session_id_for(name: SpecialistName) -> String {
    format!("pano-{}", specialist_session_name(name))
}

fn default_prompt(item: &WorkItem) -> String {
    if let Some(custom) = &item.payload.custom_prompt {
        return custom.clone();
    }
    let branch = item.payload.branch.as_deref().unwrap_or("(unknown branch)");
    format!(
        "Issue: {}\nWorkspace: {}\nBranch: {}",
        item.payload.issue_id,
        item.payload.workspace.display(),
        branch
    )
}

impl<S: SessionAdapter, C: Clock> SpecialistRegistry<S, C> {
    pub fn new(
        store: SpecialistStore,
        sessions: S,
        lock: GlobalMutationLock,
        clock: C,
        commands: HashMap<SpecialistName, SpecialistCommand>,
    ) -> Self {
        Self {
            store,
            sessions,
            lock,
            clock,
            commands,
        }
    }

    pub fn record(&self, name: SpecialistName) -> EngineResult<SpecialistRecord> {
        Ok(self
            .store
            .load_record(name)
            .map_err(storage_err)?
            .unwrap_or_else(|| SpecialistRecord::new(name)))
    }

    pub fn enqueue(&self, name: SpecialistName, item: WorkItem) -> EngineResult<()> {
        self.store.enqueue(name, item).map_err(storage_err)
    }

    pub fn dequeue(&self, name: SpecialistName) -> EngineResult<Option<WorkItem>> {
        self.store.dequeue(name).map_err(storage_err)
    }

    pub fn peek(&self, name: SpecialistName) -> EngineResult<Option<WorkItem>> {
        self.store.peek(name).map_err(storage_err)
    }

    pub fn list(&self, name: SpecialistName) -> EngineResult<Vec<WorkItem>> {
        self.store.list(name).map_err(storage_err)
    }

    pub fn remove(&self, name: SpecialistName, id: &WorkItemId) -> EngineResult<Option<WorkItem>> {
        self.store.remove(name, id).map_err(storage_err)
    }

    pub fn reorder(&self, name: SpecialistName, ids: &[WorkItemId]) -> EngineResult<()> {
        self.store.reorder(name, ids).map_err(storage_err)
    }

    /// Drop expired queue entries (Patrol step 4).
    pub fn expire(&self, name: SpecialistName) -> EngineResult<Vec<WorkItem>> {
        self.store.expire(name, self.clock.epoch_ms()).map_err(storage_err)
    }

    /// Record the specialist's current upstream-provider session token,
    /// keyed to the `session-id` file in its persisted directory — the
    /// completion-report/heartbeat wiring is expected to call this whenever
    /// the specialist process reports its own resumable conversation id.
    pub fn record_session_token(&self, name: SpecialistName, token: &str) -> EngineResult<()> {
        self.store.save_session_token(name, token).map_err(storage_err)
    }

    /// Precondition: the specialist must not currently be active.
    /// Acquires the Global Mutation Lock for the duration of the
    /// session-resume call, verifies no live tmux session already exists
    /// for this specialist, starts one, and sends the task prompt.
    pub async fn wake_with_task(&self, name: SpecialistName, item: &WorkItem) -> EngineResult<()> {
        let record = self.record(name)?;
        if record.is_busy() {
            return Err(EngineError::AlreadyRunning(name.to_string()));
        }

        let _guard = self
            .lock
            .try_acquire(format!("wake {name} for {}", item.payload.issue_id))?;

        if self.sessions.exists(&session_id_for(name)).await.map_err(session_err)? {
            return Err(EngineError::AlreadyRunning(name.to_string()));
        }

        let command = self.command_for(name);
        let token = self.store.read_session_token(name).map_err(storage_err)?;
        let cmd_line = match &token {
            Some(token) => shell_join(&command.command, &command.resume_args_for(token)),
            None => shell_join(&command.command, &command.args),
        };

        let session_id = self
            .sessions
            .spawn(&specialist_session_name(name), &item.payload.workspace, &cmd_line, &[])
            .await
            .map_err(session_err)?;

        self.sessions
            .send(&session_id, &default_prompt(item))
            .await
            .map_err(session_err)?;
        self.sessions.send_enter(&session_id).await.map_err(session_err)?;

        let now = self.clock.epoch_ms();
        self.store
            .merge_record(name, |r| {
                r.state = SpecialistRuntimeState::Active;
                r.last_wake_ms = Some(now);
                r.current_issue = Some(item.payload.issue_id.clone());
            })
            .map_err(storage_err)?;

        Ok(())
    }

    /// Wake immediately if idle; otherwise enqueue (priority ordered,
    /// stable across restarts). A race against another concurrent waker
    /// degrades to enqueueing rather than propagating the failure.
    pub async fn wake_or_queue(&self, name: SpecialistName, item: WorkItem) -> EngineResult<WakeOutcome> {
        let record = self.record(name)?;
        if !record.state.is_wake_eligible() {
            self.store.enqueue(name, item).map_err(storage_err)?;
            return Ok(WakeOutcome::Queued);
        }

        match self.wake_with_task(name, &item).await {
            Ok(()) => Ok(WakeOutcome::Woke),
            Err(EngineError::AlreadyRunning(_)) | Err(EngineError::LockBusy(_)) => {
                self.store.enqueue(name, item).map_err(storage_err)?;
                Ok(WakeOutcome::Queued)
            }
            Err(e) => Err(e),
        }
    }

    /// Kill the specialist's session and mark it suspended, preserving
    /// whatever session token was already on file for a later `resume`.
    pub async fn suspend(&self, name: SpecialistName) -> EngineResult<()> {
        let session_id = session_id_for(name);
        let _ = self.sessions.kill(&session_id).await;
        self.store
            .merge_record(name, |r| r.state = SpecialistRuntimeState::Suspended)
            .map_err(storage_err)?;
        Ok(())
    }

    /// Inverse of `suspend`: resumes the stored session token under the
    /// Global Mutation Lock, optionally sending a follow-up message.
    pub async fn resume(&self, name: SpecialistName, message: Option<&str>) -> EngineResult<()> {
        let _guard = self.lock.try_acquire(format!("resume {name}"))?;
        if self.sessions.exists(&session_id_for(name)).await.map_err(session_err)? {
            return Err(EngineError::AlreadyRunning(name.to_string()));
        }

        let token = self
            .store
            .read_session_token(name)
            .map_err(storage_err)?
            .ok_or_else(|| EngineError::InvariantViolated(format!("{name} has no session token to resume")))?;

        let command = self.command_for(name);
        let cmd_line = shell_join(&command.command, &command.resume_args_for(&token));
        // Resuming reattaches an existing provider conversation rather than
        // starting fresh in an issue's workspace, so the spawn cwd is
        // incidental; the resumed process carries its own working context.
        let session_id = self
            .sessions
            .spawn(&specialist_session_name(name), &std::env::temp_dir(), &cmd_line, &[])
            .await
            .map_err(session_err)?;

        if let Some(message) = message {
            self.sessions.send(&session_id, message).await.map_err(session_err)?;
            self.sessions.send_enter(&session_id).await.map_err(session_err)?;
        }

        let now = self.clock.epoch_ms();
        self.store
            .merge_record(name, |r| {
                r.state = SpecialistRuntimeState::Active;
                r.last_wake_ms = Some(now);
            })
            .map_err(storage_err)?;
        Ok(())
    }

    /// The specialist finished an issue: record the status note, free it
    /// up, remove the matching queue entry if present, and immediately
    /// wake the next queued item rather than waiting for the patrol loop.
    pub async fn report_completion(
        &self,
        name: SpecialistName,
        issue_id: &IssueId,
        status: &str,
        notes: &str,
    ) -> EngineResult<()> {
        self.store
            .save_issue_status(
                name,
                &IssueStatusNote {
                    issue_id: issue_id.clone(),
                    status: status.to_string(),
                    notes: notes.to_string(),
                    reported_at_ms: self.clock.epoch_ms(),
                },
            )
            .map_err(storage_err)?;

        self.store
            .merge_record(name, |r| {
                r.state = SpecialistRuntimeState::Idle;
                r.current_issue = None;
            })
            .map_err(storage_err)?;

        if let Some(item) = self
            .store
            .list(name)
            .map_err(storage_err)?
            .into_iter()
            .find(|i| &i.payload.issue_id == issue_id)
        {
            self.store.remove(name, &item.id).map_err(storage_err)?;
        }

        if let Some(next) = self.store.dequeue(name).map_err(storage_err)? {
            match self.wake_with_task(name, &next).await {
                Ok(()) => {}
                Err(EngineError::AlreadyRunning(_)) | Err(EngineError::LockBusy(_)) => {
                    self.store.enqueue(name, next).map_err(storage_err)?;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Manual `POST /specialists/:name/wake`: if idle, pop the next queued
    /// item (if any) and wake immediately — the same action the patrol loop
    /// would eventually take, just not deferred to the next tick.
    pub async fn wake_next(&self, name: SpecialistName) -> EngineResult<WakeOutcome> {
        let record = self.record(name)?;
        if !record.state.is_wake_eligible() {
            return Err(EngineError::AlreadyRunning(name.to_string()));
        }
        let Some(item) = self.store.dequeue(name).map_err(storage_err)? else {
            return Ok(WakeOutcome::Queued);
        };
        match self.wake_with_task(name, &item).await {
            Ok(()) => Ok(WakeOutcome::Woke),
            Err(e) => {
                self.store.enqueue(name, item).map_err(storage_err)?;
                Err(e)
            }
        }
    }

    /// `POST /specialists/:name/reset`: force a specialist back to `Idle`
    /// regardless of its current state — kills any live session (best
    /// effort) and clears `currentIssue`, but leaves its queue and session
    /// token intact. An admin escape hatch for a specialist the patrol loop
    /// and normal completion reporting can't unstick on their own.
    pub async fn reset(&self, name: SpecialistName) -> EngineResult<()> {
        let session_id = session_id_for(name);
        let _ = self.sessions.kill(&session_id).await;
        self.store
            .merge_record(name, |r| {
                r.state = SpecialistRuntimeState::Idle;
                r.current_issue = None;
            })
            .map_err(storage_err)
    }

    /// `POST /specialists/reset-all`: `reset` applied to all three
    /// singletons.
    pub async fn reset_all(&self) -> EngineResult<()> {
        for name in SpecialistName::ALL {
            self.reset(name).await?;
        }
        Ok(())
    }

    /// `POST /specialists/:name/init`: ensure a durable record exists so the
    /// specialist shows up in listings before its first wake, without
    /// starting a session.
    pub fn init(&self, name: SpecialistName) -> EngineResult<SpecialistRecord> {
        if let Some(existing) = self.store.load_record(name).map_err(storage_err)? {
            return Ok(existing);
        }
        let record = SpecialistRecord::new(name);
        self.store.save_record(&record).map_err(storage_err)?;
        Ok(record)
    }

    fn command_for(&self, name: SpecialistName) -> SpecialistCommand {
        self.commands
            .get(&name)
            .cloned()
            .unwrap_or_else(|| SpecialistCommand::defaults().remove(&name).unwrap_or(SpecialistCommand {
                command: "claude".to_string(),
                args: vec![],
                resume_args: vec![],
            }))
    }
}

fn shell_join(command: &str, args: &[String]) -> String {
    let mut parts = vec![command.to_string()];
    parts.extend(args.iter().cloned());
    parts.join(" ")
}

#[cfg(test)]
#[path = "specialists_tests.rs"]
mod tests;
