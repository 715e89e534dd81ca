// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client: connects over the Unix socket and speaks the framed
//! request/response protocol defined in `panopticon_daemon::protocol`.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use panopticon_core::{
    HealthRecord, OperationRecord, PendingQuestion, Priority, QuestionAnswer, ReviewStatus,
    SpecialistName, SpecialistRecord, WorkItem, WorkItemId, WorkerRuntimeState,
};
use panopticon_daemon::protocol::{self, DaemonStatus, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

use crate::daemon_process::{
    cleanup_stale_socket, daemon_socket, probe_socket, start_daemon_background, stop_daemon_sync,
};
use crate::env;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running")]
    DaemonNotRunning,
    #[error("failed to start daemon: {0}")]
    DaemonStartFailed(String),
    #[error("timed out waiting for daemon to start")]
    DaemonStartTimeout,
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("{0}")]
    Rejected(String),
    #[error("unexpected response from daemon")]
    UnexpectedResponse,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// View of a worker agent, re-exported here so command modules don't need
/// to reach into `panopticon_daemon::protocol` directly.
pub type AgentView = protocol::AgentView;

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// For commands that mutate state — auto-starts the daemon if it isn't
    /// already running.
    pub fn for_action() -> Result<Self, ClientError> {
        Self::connect_or_start()
    }

    /// For read-only commands — connects to an existing daemon only.
    pub fn for_query() -> Result<Self, ClientError> {
        Self::connect()
    }

    /// For hook-originated signals (heartbeats) — same as `for_query`: a
    /// hook firing while the daemon is down has nothing useful to report to,
    /// and auto-starting here would restart the daemon out from under a
    /// session the hook doesn't know is already gone.
    pub fn for_signal() -> Result<Self, ClientError> {
        Self::connect()
    }

    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = daemon_socket();
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self { socket_path })
    }

    pub fn connect_or_start() -> Result<Self, ClientError> {
        match Self::connect() {
            Ok(client) => {
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    cleanup_stale_socket();
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(env::timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(env::timeout_connect(), child)
            }
            Err(e) => Err(e),
        }
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if let Ok(Some(status)) = child.try_wait() {
                return Err(ClientError::DaemonStartFailed(format!(
                    "panod exited during startup with {status}"
                )));
            }
            match Self::connect() {
                Ok(client) => return Ok(client),
                Err(ClientError::DaemonNotRunning) => {
                    std::thread::sleep(env::poll_interval());
                }
                Err(e) => return Err(e),
            }
        }
        Err(ClientError::DaemonStartTimeout)
    }

    async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();
        let timeout = env::timeout_ipc();
        protocol::write_request(&mut writer, request, timeout).await?;
        Ok(protocol::read_response(&mut reader, timeout).await?)
    }

    async fn send_ok(&self, request: &Request) -> Result<(), ClientError> {
        match self.send(request).await? {
            Response::Ok => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            other => Self::unexpected(other),
        }
    }

    fn unexpected<T>(resp: Response) -> Result<T, ClientError> {
        match resp {
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Self::unexpected(other),
        }
    }

    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status(status) => Ok(status),
            other => Self::unexpected(other),
        }
    }

    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::ShuttingDown | Response::Ok => {
                stop_daemon_sync();
                Ok(())
            }
            other => Self::unexpected(other),
        }
    }

    pub async fn agent_list(&self) -> Result<Vec<AgentView>, ClientError> {
        match self.send(&Request::AgentList).await? {
            Response::Agents(agents) => Ok(agents),
            other => Self::unexpected(other),
        }
    }

    pub async fn agent_get(&self, agent_id: &str) -> Result<AgentView, ClientError> {
        match self
            .send(&Request::AgentGet { agent_id: agent_id.to_string() })
            .await?
        {
            Response::Agent(agent) => Ok(agent),
            other => Self::unexpected(other),
        }
    }

    pub async fn agent_spawn(
        &self,
        issue_id: &str,
        workspace_path: PathBuf,
        runtime_kind: Option<String>,
        declared_model: Option<String>,
    ) -> Result<AgentView, ClientError> {
        let request = Request::AgentSpawn {
            issue_id: issue_id.to_string(),
            workspace_path,
            runtime_kind: runtime_kind.unwrap_or_else(|| "claude-code".to_string()),
            declared_model: declared_model.unwrap_or_else(|| "default".to_string()),
        };
        match self.send(&request).await? {
            Response::Agent(agent) => Ok(agent),
            other => Self::unexpected(other),
        }
    }

    pub async fn agent_kill(&self, agent_id: &str) -> Result<(), ClientError> {
        self.send_ok(&Request::AgentKill { agent_id: agent_id.to_string() }).await
    }

    pub async fn agent_message(&self, agent_id: &str, text: &str) -> Result<(), ClientError> {
        self.send_ok(&Request::AgentMessage {
            agent_id: agent_id.to_string(),
            text: text.to_string(),
        })
        .await
    }

    pub async fn agent_poke(
        &self,
        agent_id: &str,
        message: Option<String>,
    ) -> Result<(), ClientError> {
        self.send_ok(&Request::AgentPoke { agent_id: agent_id.to_string(), message }).await
    }

    pub async fn agent_suspend(
        &self,
        agent_id: &str,
        session_token: Option<String>,
    ) -> Result<(), ClientError> {
        self.send_ok(&Request::AgentSuspend { agent_id: agent_id.to_string(), session_token })
            .await
    }

    pub async fn agent_resume(
        &self,
        agent_id: &str,
        message: Option<String>,
    ) -> Result<AgentView, ClientError> {
        match self
            .send(&Request::AgentResume { agent_id: agent_id.to_string(), message })
            .await?
        {
            Response::Agent(agent) => Ok(agent),
            other => Self::unexpected(other),
        }
    }

    pub async fn agent_handoff(
        &self,
        agent_id: &str,
        to_model: &str,
        reason: Option<String>,
    ) -> Result<AgentView, ClientError> {
        let request = Request::AgentHandoff {
            agent_id: agent_id.to_string(),
            to_model: to_model.to_string(),
            reason,
        };
        match self.send(&request).await? {
            Response::Agent(agent) => Ok(agent),
            other => Self::unexpected(other),
        }
    }

    pub async fn agent_activity(
        &self,
        agent_id: &str,
        limit: usize,
    ) -> Result<Vec<serde_json::Value>, ClientError> {
        match self.send(&Request::AgentActivity { agent_id: agent_id.to_string(), limit }).await? {
            Response::Activity(entries) => Ok(entries),
            other => Self::unexpected(other),
        }
    }

    pub async fn agent_heartbeat(
        &self,
        agent_id: &str,
        state: WorkerRuntimeState,
        tool: Option<String>,
        session_id: Option<String>,
    ) -> Result<(), ClientError> {
        self.send_ok(&Request::AgentHeartbeat {
            agent_id: agent_id.to_string(),
            state,
            tool,
            session_id,
        })
        .await
    }

    pub async fn agent_pending_questions(
        &self,
        agent_id: &str,
    ) -> Result<Vec<PendingQuestion>, ClientError> {
        match self
            .send(&Request::AgentPendingQuestions { agent_id: agent_id.to_string() })
            .await?
        {
            Response::PendingQuestions(questions) => Ok(questions),
            other => Self::unexpected(other),
        }
    }

    pub async fn agent_answer_question(
        &self,
        agent_id: &str,
        answers: Vec<QuestionAnswer>,
    ) -> Result<(), ClientError> {
        self.send_ok(&Request::AgentAnswerQuestion { agent_id: agent_id.to_string(), answers })
            .await
    }

    pub async fn specialist_list(&self) -> Result<Vec<SpecialistRecord>, ClientError> {
        match self.send(&Request::SpecialistList).await? {
            Response::Specialists(records) => Ok(records),
            other => Self::unexpected(other),
        }
    }

    pub async fn specialist_queue_list(
        &self,
        name: SpecialistName,
    ) -> Result<Vec<WorkItem>, ClientError> {
        match self.send(&Request::SpecialistQueueList { name }).await? {
            Response::Queue(items) => Ok(items),
            other => Self::unexpected(other),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn specialist_queue_push(
        &self,
        name: SpecialistName,
        issue_id: &str,
        workspace_path: PathBuf,
        branch: Option<String>,
        custom_prompt: Option<String>,
        priority: Priority,
    ) -> Result<(), ClientError> {
        let request = Request::SpecialistQueuePush {
            name,
            issue_id: issue_id.to_string(),
            workspace_path,
            branch,
            custom_prompt,
            priority,
        };
        self.send_ok(&request).await
    }

    pub async fn specialist_queue_remove(
        &self,
        name: SpecialistName,
        id: WorkItemId,
    ) -> Result<Option<WorkItem>, ClientError> {
        match self.send(&Request::SpecialistQueueRemove { name, id }).await? {
            Response::QueueItem(item) => Ok(item),
            other => Self::unexpected(other),
        }
    }

    pub async fn specialist_queue_reorder(
        &self,
        name: SpecialistName,
        ids: Vec<WorkItemId>,
    ) -> Result<(), ClientError> {
        self.send_ok(&Request::SpecialistQueueReorder { name, ids }).await
    }

    pub async fn specialist_suspend(&self, name: SpecialistName) -> Result<(), ClientError> {
        self.send_ok(&Request::SpecialistSuspend { name }).await
    }

    pub async fn specialist_resume(
        &self,
        name: SpecialistName,
        message: Option<String>,
    ) -> Result<(), ClientError> {
        self.send_ok(&Request::SpecialistResume { name, message }).await
    }

    pub async fn specialist_wake(&self, name: SpecialistName) -> Result<bool, ClientError> {
        match self.send(&Request::SpecialistWake { name }).await? {
            Response::SpecialistWoke { queued } => Ok(queued),
            other => Self::unexpected(other),
        }
    }

    pub async fn specialist_reset(&self, name: SpecialistName) -> Result<(), ClientError> {
        self.send_ok(&Request::SpecialistReset { name }).await
    }

    pub async fn specialist_reset_all(&self) -> Result<(), ClientError> {
        self.send_ok(&Request::SpecialistResetAll).await
    }

    pub async fn specialist_init(&self, name: SpecialistName) -> Result<SpecialistRecord, ClientError> {
        match self.send(&Request::SpecialistInit { name }).await? {
            Response::Specialist(record) => Ok(record),
            other => Self::unexpected(other),
        }
    }

    pub async fn specialist_done(
        &self,
        name: SpecialistName,
        issue_id: &str,
        status: &str,
        notes: String,
    ) -> Result<(), ClientError> {
        let request = Request::SpecialistDone {
            name,
            issue_id: issue_id.to_string(),
            status: status.to_string(),
            notes,
        };
        self.send_ok(&request).await
    }

    pub async fn review_start(
        &self,
        issue_id: &str,
        branch: Option<String>,
    ) -> Result<bool, ClientError> {
        let request = Request::ReviewStart { issue_id: issue_id.to_string(), branch };
        match self.send(&request).await? {
            Response::ReviewStarted { queued } => Ok(queued),
            other => Self::unexpected(other),
        }
    }

    pub async fn review_status_get(
        &self,
        issue_id: &str,
    ) -> Result<Option<ReviewStatus>, ClientError> {
        match self
            .send(&Request::ReviewStatusGet { issue_id: issue_id.to_string() })
            .await?
        {
            Response::ReviewStatus(status) => Ok(status),
            other => Self::unexpected(other),
        }
    }

    pub async fn review_status_all(
        &self,
    ) -> Result<std::collections::HashMap<String, ReviewStatus>, ClientError> {
        match self.send(&Request::ReviewStatusAll).await? {
            Response::ReviewStatuses(statuses) => Ok(statuses),
            other => Self::unexpected(other),
        }
    }

    pub async fn operations_list(&self) -> Result<Vec<OperationRecord>, ClientError> {
        match self.send(&Request::OperationsList).await? {
            Response::Operations(ops) => Ok(ops),
            other => Self::unexpected(other),
        }
    }
}

/// `AgentView::health` re-exported for command modules formatting health
/// without importing `panopticon_core` directly.
pub type AgentHealth = HealthRecord;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
