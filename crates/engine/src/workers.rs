// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker Agent Supervisor: spawns per-issue agents bound to a
//! workspace, and exposes kill/poke/resume/handoff/answer-question as
//! idempotent operations on the durable state in the Agent State Store
//!. Delegates the Claude-Code-specific spawn handshake (workspace
//! prep, trust/bypass-permissions/login prompts) to the Agent Adapter, and
//! session-resume serialization to the Global Mutation Lock.

use crate::convert::{agent_err, storage_err};
use crate::lock::GlobalMutationLock;
use panopticon_adapters::agent::{AgentAdapter, AgentReconnectConfig, AgentSpawnConfig};
use panopticon_config::WorkerCommand;
use panopticon_core::{
    AgentId, AgentRecord, Clock, EngineError, EngineResult, HealthRecord, HealthStatus, IssueId,
    RuntimeRecord, WorkerRuntimeState,
};
use panopticon_storage::AgentStore;
use std::path::PathBuf;

/// Default nudge sent by `poke` when the caller doesn't supply one.
pub const DEFAULT_POKE_MESSAGE: &str =
    "Please check your task notes and continue from where you left off.";

#[derive(Clone)]
pub struct WorkerSupervisor<A: AgentAdapter, C: Clock> {
    store: AgentStore,
    agents: A,
    lock: GlobalMutationLock,
    clock: C,
    command: WorkerCommand,
    activity_retention: usize,
}

impl<A: AgentAdapter, C: Clock> WorkerSupervisor<A, C> {
    pub fn new(
        store: AgentStore,
        agents: A,
        lock: GlobalMutationLock,
        clock: C,
        command: WorkerCommand,
        activity_retention: usize,
    ) -> Self {
        Self {
            store,
            agents,
            lock,
            clock,
            command,
            activity_retention,
        }
    }

    /// Derive the declared agent id for an issue and load its durable
    /// record, if any has ever been spawned.
    pub fn record(&self, issue_id: &IssueId) -> EngineResult<Option<AgentRecord>> {
        let agent_id = AgentId::for_issue(issue_id);
        self.store.load_state(&agent_id).map_err(storage_err)
    }

    /// Every worker agent with durable state, for the control surface's
    /// agent listing.
    pub fn list(&self) -> EngineResult<Vec<AgentRecord>> {
        let mut records = Vec::new();
        for agent_id in self.store.list_agent_ids().map_err(storage_err)? {
            if let Some(record) = self.store.load_state(&agent_id).map_err(storage_err)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// The cached health classification for one agent, if it has ever been
    /// computed (Patrol Loop writes it; a brand new agent has none yet).
    pub fn health(&self, agent_id: &AgentId) -> EngineResult<Option<HealthRecord>> {
        self.store.load_health(agent_id).map_err(storage_err)
    }

    /// Spawn a worker agent bound to `workspace_path` for `issue_id`.
    /// Idempotent: if the agent already has durable state and its session
    /// can be reconnected, returns the existing record rather than
    /// double-spawning — one live terminal session per agent id.
    pub async fn spawn(
        &self,
        issue_id: IssueId,
        workspace_path: PathBuf,
        runtime_kind: impl Into<String>,
        declared_model: impl Into<String>,
    ) -> EngineResult<AgentRecord> {
        let agent_id = AgentId::for_issue(&issue_id);

        if let Some(existing) = self.store.load_state(&agent_id).map_err(storage_err)? {
            if let Ok(tmux_id) = tmux_session_id(&agent_id) {
                let reconnect = self
                    .agents
                    .reconnect(AgentReconnectConfig {
                        agent_id: agent_id.clone(),
                        session_id: tmux_id,
                        workspace_path: existing.workspace_path.clone(),
                    })
                    .await;
                if reconnect.is_ok() {
                    return Ok(existing);
                }
            }
        }

        let now = self.clock.epoch_ms();
        let prompt = default_prompt(&issue_id, &workspace_path);
        let handle = self
            .agents
            .spawn(AgentSpawnConfig {
                agent_id: agent_id.clone(),
                command: self.command.command.clone(),
                args: self.command.args.clone(),
                env: Vec::new(),
                workspace_path: workspace_path.clone(),
                cwd: None,
                project_root: workspace_path.clone(),
                prompt,
            })
            .await
            .map_err(agent_err)?;

        let record = AgentRecord::new(
            agent_id.clone(),
            issue_id,
            workspace_path,
            runtime_kind,
            declared_model,
            now,
        );
        self.store.save_state(&record).map_err(storage_err)?;
        self.store
            .save_runtime(&agent_id, &RuntimeRecord::default())
            .map_err(storage_err)?;
        self.store
            .save_health(
                &agent_id,
                &HealthRecord {
                    status: HealthStatus::Active,
                    computed_at_ms: now,
                },
            )
            .map_err(storage_err)?;
        self.store
            .save_session_id(&agent_id, &handle.session_id)
            .map_err(storage_err)?;
        Ok(record)
    }

    /// Kill the agent's session and purge its state directory. Best-effort
    /// and idempotent: a missing agent, or one whose session is
    /// already gone, is not an error.
    pub async fn kill(&self, agent_id: &AgentId) -> EngineResult<()> {
        if let Some(state) = self.store.load_state(agent_id).map_err(storage_err)? {
            if self.agents.kill(agent_id).await.is_err() {
                if let Ok(tmux_id) = tmux_session_id(agent_id) {
                    let _ = self
                        .agents
                        .reconnect(AgentReconnectConfig {
                            agent_id: agent_id.clone(),
                            session_id: tmux_id,
                            workspace_path: state.workspace_path,
                        })
                        .await;
                    let _ = self.agents.kill(agent_id).await;
                }
            }
        }
        self.store.purge(agent_id).map_err(storage_err)
    }

    /// Send text then Enter — one "user turn".
    pub async fn send_message(&self, agent_id: &AgentId, text: &str) -> EngineResult<()> {
        self.ensure_connected(agent_id).await?;
        self.agents.send(agent_id, text).await.map_err(agent_err)?;
        self.append_activity(agent_id, "message", text)
    }

    /// Send a nudge — the default guides the agent to re-check its task
    /// notes.
    pub async fn poke(&self, agent_id: &AgentId, message: Option<&str>) -> EngineResult<()> {
        let text = message.unwrap_or(DEFAULT_POKE_MESSAGE);
        self.send_message(agent_id, text).await
    }

    /// Kill the session and record a suspended runtime state, preserving
    /// whatever session token the caller supplies (e.g. reported by the
    /// agent's own hook right before suspension) for a later `resume`.
    pub async fn suspend(&self, agent_id: &AgentId, session_token: Option<&str>) -> EngineResult<()> {
        if let Some(token) = session_token {
            self.store
                .save_session_id(agent_id, token)
                .map_err(storage_err)?;
            self.store
                .merge_state(agent_id, |r| r.session_token = Some(token.to_string()))
                .map_err(storage_err)?;
        }
        let _ = self.agents.kill(agent_id).await;
        let now = self.clock.epoch_ms();
        self.store
            .merge_runtime(agent_id, |r| {
                r.state = WorkerRuntimeState::Suspended;
                r.suspended_at_ms = Some(now);
            })
            .map_err(storage_err)?;
        Ok(())
    }

    /// Inverse of `suspend`: starts a new detached session resuming the
    /// saved token, under the Global Mutation Lock, optionally
    /// following with a message.
    pub async fn resume(&self, agent_id: &AgentId, message: Option<&str>) -> EngineResult<AgentRecord> {
        let record = self
            .store
            .load_state(agent_id)
            .map_err(storage_err)?
            .ok_or_else(|| EngineError::not_found(format!("agent {agent_id}")))?;
        let token = self
            .store
            .read_session_id(agent_id)
            .map_err(storage_err)?
            .or_else(|| record.session_token.clone())
            .ok_or_else(|| {
                EngineError::InvariantViolated(format!("{agent_id} has no session token to resume"))
            })?;

        let _guard = self.lock.try_acquire(format!("resume {agent_id}"))?;

        let handle = self
            .agents
            .spawn(AgentSpawnConfig {
                agent_id: agent_id.clone(),
                command: self.command.command.clone(),
                args: self.command.resume_args_for(&token),
                env: Vec::new(),
                workspace_path: record.workspace_path.clone(),
                cwd: None,
                project_root: record.workspace_path.clone(),
                prompt: message.unwrap_or_default().to_string(),
            })
            .await
            .map_err(agent_err)?;

        self.store
            .save_session_id(agent_id, &handle.session_id)
            .map_err(storage_err)?;
        self.store
            .merge_runtime(agent_id, |r| {
                r.state = WorkerRuntimeState::Working;
                r.suspended_at_ms = None;
            })
            .map_err(storage_err)?;
        Ok(record)
    }

    /// Spawn a replacement agent bound to the same workspace under the
    /// same id but a different declared model, transferring session-resume
    /// context when a token is on file. Records a handoff activity entry
    /// for observability.
    pub async fn handoff(
        &self,
        agent_id: &AgentId,
        to_model: &str,
        reason: Option<&str>,
    ) -> EngineResult<AgentRecord> {
        let mut record = self
            .store
            .load_state(agent_id)
            .map_err(storage_err)?
            .ok_or_else(|| EngineError::not_found(format!("agent {agent_id}")))?;

        let _ = self.agents.kill(agent_id).await;

        let token = self
            .store
            .read_session_id(agent_id)
            .map_err(storage_err)?
            .or_else(|| record.session_token.clone());
        let args = match &token {
            Some(t) => self.command.resume_args_for(t),
            None => self.command.args.clone(),
        };

        let handle = self
            .agents
            .spawn(AgentSpawnConfig {
                agent_id: agent_id.clone(),
                command: self.command.command.clone(),
                args,
                env: Vec::new(),
                workspace_path: record.workspace_path.clone(),
                cwd: None,
                project_root: record.workspace_path.clone(),
                prompt: String::new(),
            })
            .await
            .map_err(agent_err)?;

        let from_model = record.declared_model.clone();
        record.declared_model = to_model.to_string();
        self.store.save_state(&record).map_err(storage_err)?;
        self.store
            .save_session_id(agent_id, &handle.session_id)
            .map_err(storage_err)?;

        let entry = serde_json::json!({
            "type": "handoff",
            "from_model": from_model,
            "to_model": to_model,
            "reason": reason,
            "at_ms": self.clock.epoch_ms(),
        });
        self.store
            .append_activity(agent_id, &entry, self.activity_retention)
            .map_err(storage_err)?;
        Ok(record)
    }

    pub fn read_activity(&self, agent_id: &AgentId, limit: usize) -> EngineResult<Vec<serde_json::Value>> {
        self.store.read_activity(agent_id, limit).map_err(storage_err)
    }

    /// Record a hook heartbeat POST: `{state, tool, timestamp}`, optionally
    /// carrying the agent's own session id (used by the Transcript Reader
    /// and by `resume` as a fallback token).
    pub fn record_heartbeat(
        &self,
        agent_id: &AgentId,
        state: WorkerRuntimeState,
        tool: Option<&str>,
        session_id: Option<&str>,
    ) -> EngineResult<()> {
        let now = self.clock.epoch_ms();
        self.store
            .merge_runtime(agent_id, |r| {
                r.state = state;
                r.last_activity_ms = Some(now);
                r.current_tool = tool.map(str::to_string);
                if let Some(sid) = session_id {
                    r.session_id = Some(sid.to_string());
                }
            })
            .map_err(storage_err)?;
        let entry = serde_json::json!({
            "type": "heartbeat",
            "tool": tool,
            "at_ms": now,
        });
        self.store
            .append_activity(agent_id, &entry, self.activity_retention)
            .map_err(storage_err)?;
        Ok(())
    }

    /// Opportunistic, best-effort reconnect against the derived tmux
    /// session id: lets `send_message`/`poke` survive a daemon restart
    /// without requiring an explicit reconnect call first. Failure here is
    /// not fatal — the subsequent `send` surfaces whatever the real
    /// problem is (e.g. the session genuinely doesn't exist).
    async fn ensure_connected(&self, agent_id: &AgentId) -> EngineResult<()> {
        if let Some(state) = self.store.load_state(agent_id).map_err(storage_err)? {
            if let Ok(tmux_id) = tmux_session_id(agent_id) {
                let _ = self
                    .agents
                    .reconnect(AgentReconnectConfig {
                        agent_id: agent_id.clone(),
                        session_id: tmux_id,
                        workspace_path: state.workspace_path,
                    })
                    .await;
            }
        }
        Ok(())
    }

    fn append_activity(&self, agent_id: &AgentId, kind: &str, text: &str) -> EngineResult<()> {
        let entry = serde_json::json!({
            "type": kind,
            "text": text,
            "at_ms": self.clock.epoch_ms(),
        });
        self.store
            .append_activity(agent_id, &entry, self.activity_retention)
            .map_err(storage_err)
    }
}

/// The deterministic tmux session id `TmuxAdapter::spawn` derives from an
/// agent id — lets reconnect-on-restart work without persisting anything.
fn tmux_session_id(agent_id: &AgentId) -> Result<String, EngineError> {
    Ok(format!("pano-{}", agent_id.as_str()))
}

fn default_prompt(issue_id: &IssueId, workspace_path: &std::path::Path) -> String {
    format!(
        "Issue: {}\nWorkspace: {}",
        issue_id,
        workspace_path.display()
    )
}

#[cfg(test)]
#[path = "workers_tests.rs"]
mod tests;
