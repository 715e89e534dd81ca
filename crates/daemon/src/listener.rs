// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix socket accept loop and request dispatch. One task per connection;
//! each request is handled to completion before the next is read off the
//! same connection (no pipelining — the CLI only ever sends one request at
//! a time per call).

use crate::lifecycle::Daemon;
use crate::protocol::{self, AgentView, DaemonStatus, Request, Response, DEFAULT_TIMEOUT};
use panopticon_core::{
    AgentId, Clock, EngineError, IssueId, Priority, ReviewStatus, SpecialistName, SystemClock,
    WorkItem, WorkItemId, WorkItemKind, WorkItemPayload,
};
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;

pub struct ListenCtx {
    pub daemon: Arc<Daemon>,
    pub shutdown: Arc<Notify>,
}

pub struct Listener {
    socket: UnixListener,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn bind(socket_path: &std::path::Path, ctx: Arc<ListenCtx>) -> std::io::Result<Self> {
        let _ = std::fs::remove_file(socket_path);
        let socket = UnixListener::bind(socket_path)?;
        Ok(Self { socket, ctx })
    }

    /// Accept loop. Exits only when the shutdown notification fires; each
    /// accepted connection is handled on its own task so one slow client
    /// never blocks another.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.ctx.shutdown.notified() => {
                    tracing::info!("listener: shutdown requested, stopping accept loop");
                    return;
                }
                accepted = self.socket.accept() => {
                    match accepted {
                        Ok((stream, _addr)) => {
                            let ctx = self.ctx.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, ctx).await {
                                    tracing::debug!(error = %e, "connection ended");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "accept failed");
                        }
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: UnixStream,
    ctx: Arc<ListenCtx>,
) -> Result<(), protocol::ProtocolError> {
    loop {
        let request = match protocol::read_request(&mut stream, DEFAULT_TIMEOUT).await {
            Ok(r) => r,
            Err(protocol::ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };
        tracing::debug!(?request, "handling request");

        let is_shutdown = matches!(request, Request::Shutdown);
        let response = handle_request(&ctx, request).await;
        protocol::write_response(&mut stream, &response, DEFAULT_TIMEOUT).await?;

        if is_shutdown {
            ctx.shutdown.notify_waiters();
            return Ok(());
        }
    }
}

async fn handle_request(ctx: &ListenCtx, request: Request) -> Response {
    let daemon = &ctx.daemon;
    match request {
        Request::Ping => Response::Pong,
        Request::Hello { .. } => Response::Hello {
            version: protocol::PROTOCOL_VERSION.to_string(),
        },
        Request::Status => Response::Status(daemon_status(daemon)),
        Request::Shutdown => Response::ShuttingDown,

        Request::AgentList => match daemon.workers.list() {
            Ok(records) => Response::Agents(
                records
                    .into_iter()
                    .map(|r| to_agent_view(daemon, r))
                    .collect(),
            ),
            Err(e) => engine_err(e),
        },
        Request::AgentGet { agent_id } => {
            let id = AgentId::new(agent_id);
            match daemon.workers.record(&issue_of(&id)) {
                Ok(Some(record)) => Response::Agent(to_agent_view(daemon, record)),
                Ok(None) => Response::Error {
                    message: format!("agent {id} not found"),
                },
                Err(e) => engine_err(e),
            }
        }
        Request::AgentSpawn {
            issue_id,
            workspace_path,
            runtime_kind,
            declared_model,
        } => {
            let issue = IssueId::new(issue_id);
            match daemon
                .workers
                .spawn(issue, workspace_path, runtime_kind, declared_model)
                .await
            {
                Ok(record) => Response::Agent(to_agent_view(daemon, record)),
                Err(e) => engine_err(e),
            }
        }
        Request::AgentKill { agent_id } => ok_or_err(daemon.workers.kill(&AgentId::new(agent_id)).await),
        Request::AgentMessage { agent_id, text } => {
            ok_or_err(daemon.workers.send_message(&AgentId::new(agent_id), &text).await)
        }
        Request::AgentPoke { agent_id, message } => ok_or_err(
            daemon
                .workers
                .poke(&AgentId::new(agent_id), message.as_deref())
                .await,
        ),
        Request::AgentSuspend {
            agent_id,
            session_token,
        } => ok_or_err(
            daemon
                .workers
                .suspend(&AgentId::new(agent_id), session_token.as_deref())
                .await,
        ),
        Request::AgentResume { agent_id, message } => {
            match daemon
                .workers
                .resume(&AgentId::new(agent_id), message.as_deref())
                .await
            {
                Ok(record) => Response::Agent(to_agent_view(daemon, record)),
                Err(e) => engine_err(e),
            }
        }
        Request::AgentHandoff {
            agent_id,
            to_model,
            reason,
        } => {
            match daemon
                .workers
                .handoff(&AgentId::new(agent_id), &to_model, reason.as_deref())
                .await
            {
                Ok(record) => Response::Agent(to_agent_view(daemon, record)),
                Err(e) => engine_err(e),
            }
        }
        Request::AgentActivity { agent_id, limit } => {
            match daemon.workers.read_activity(&AgentId::new(agent_id), limit) {
                Ok(entries) => Response::Activity(entries),
                Err(e) => engine_err(e),
            }
        }
        Request::AgentHeartbeat {
            agent_id,
            state,
            tool,
            session_id,
        } => ok_or_err(daemon.workers.record_heartbeat(
            &AgentId::new(agent_id),
            state,
            tool.as_deref(),
            session_id.as_deref(),
        )),
        Request::AgentPendingQuestions { agent_id } => {
            match daemon.questions.pending(&AgentId::new(agent_id)).await {
                Ok(questions) => Response::PendingQuestions(questions),
                Err(e) => engine_err(e),
            }
        }
        Request::AgentAnswerQuestion { agent_id, answers } => ok_or_err(
            daemon
                .questions
                .answer(&AgentId::new(agent_id), &answers)
                .await,
        ),

        Request::SpecialistList => {
            let records: Vec<_> = SpecialistName::ALL
                .into_iter()
                .filter_map(|name| daemon.specialists.record(name).ok())
                .collect();
            Response::Specialists(records)
        }
        Request::SpecialistQueueList { name } => match daemon.specialists.list(name) {
            Ok(items) => Response::Queue(items),
            Err(e) => engine_err(e),
        },
        Request::SpecialistQueuePush {
            name,
            issue_id,
            workspace_path,
            branch,
            custom_prompt,
            priority,
        } => {
            let item = new_work_item(issue_id, workspace_path, branch, custom_prompt, priority);
            ok_or_err(daemon.specialists.enqueue(name, item))
        }
        Request::SpecialistQueueRemove { name, id } => {
            match daemon.specialists.remove(name, &id) {
                Ok(item) => Response::QueueItem(item),
                Err(e) => engine_err(e),
            }
        }
        Request::SpecialistQueueReorder { name, ids } => {
            ok_or_err(daemon.specialists.reorder(name, &ids))
        }
        Request::SpecialistSuspend { name } => ok_or_err(daemon.specialists.suspend(name).await),
        Request::SpecialistResume { name, message } => {
            ok_or_err(daemon.specialists.resume(name, message.as_deref()).await)
        }
        Request::SpecialistWake { name } => match daemon.specialists.wake_next(name).await {
            Ok(outcome) => Response::SpecialistWoke {
                queued: matches!(outcome, panopticon_engine::specialists::WakeOutcome::Queued),
            },
            Err(e) => engine_err(e),
        },
        Request::SpecialistReset { name } => ok_or_err(daemon.specialists.reset(name).await),
        Request::SpecialistResetAll => ok_or_err(daemon.specialists.reset_all().await),
        Request::SpecialistInit { name } => match daemon.specialists.init(name) {
            Ok(record) => Response::Specialist(record),
            Err(e) => engine_err(e),
        },
        Request::SpecialistDone {
            name,
            issue_id,
            status,
            notes,
        } => match panopticon_engine::pipeline::ReportedStatus::parse(&status) {
            Some(status) => ok_or_err(
                daemon
                    .pipeline
                    .report_status(name, &IssueId::new(issue_id), status, &notes)
                    .await,
            ),
            None => Response::Error {
                message: format!("unknown status '{status}'"),
            },
        },

        Request::ReviewStart { issue_id, branch } => {
            match daemon
                .pipeline
                .start_review(&IssueId::new(issue_id), branch.as_deref())
                .await
            {
                Ok(outcome) => Response::ReviewStarted {
                    queued: matches!(outcome, panopticon_engine::pipeline::StartReviewOutcome::Queued),
                },
                Err(e) => engine_err(e),
            }
        }
        Request::ReviewStatusGet { issue_id } => {
            Response::ReviewStatus(daemon.pipeline.status(&IssueId::new(issue_id)))
        }
        Request::ReviewStatusAll => Response::ReviewStatuses(
            daemon
                .pipeline
                .all_statuses()
                .into_iter()
                .map(|(issue, status)| (issue.as_str().to_string(), status))
                .collect::<std::collections::HashMap<String, ReviewStatus>>(),
        ),

        Request::OperationsList => Response::Operations(daemon.patrol.operations()),
    }
}

fn ok_or_err(result: panopticon_core::EngineResult<()>) -> Response {
    match result {
        Ok(()) => Response::Ok,
        Err(e) => engine_err(e),
    }
}

fn engine_err(e: EngineError) -> Response {
    Response::Error {
        message: e.to_string(),
    }
}

/// `AgentGet`/`AgentList` key by issue through `WorkerSupervisor::record`,
/// but the wire protocol addresses agents by their derived id — recover the
/// issue from the id's known `agent-<issue-lower>` shape. This only ever
/// fails for a hand-typed id that was never actually derived from an issue,
/// in which case the lookup below simply reports "not found".
fn issue_of(agent_id: &AgentId) -> IssueId {
    IssueId::new(
        agent_id
            .as_str()
            .strip_prefix("agent-")
            .unwrap_or(agent_id.as_str())
            .to_string(),
    )
}

fn to_agent_view(daemon: &Daemon, record: panopticon_core::AgentRecord) -> AgentView {
    let health = daemon.workers.health(&record.id).ok().flatten();
    AgentView {
        agent_id: record.id.as_str().to_string(),
        issue_id: record.issue_id.as_str().to_string(),
        workspace_path: record.workspace_path,
        declared_model: record.declared_model,
        health,
    }
}

fn daemon_status(daemon: &Daemon) -> DaemonStatus {
    let agent_count = daemon.workers.list().map(|v| v.len()).unwrap_or(0);
    let pending_operations = daemon.patrol.operations().len();
    DaemonStatus {
        version: protocol::PROTOCOL_VERSION.to_string(),
        uptime_secs: panopticon_core::SystemClock
            .epoch_ms()
            .saturating_sub(daemon.started_at_ms)
            / 1000,
        agent_count,
        pending_operations,
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;

#[allow(clippy::too_many_arguments)]
fn new_work_item(
    issue_id: String,
    workspace: std::path::PathBuf,
    branch: Option<String>,
    custom_prompt: Option<String>,
    priority: Priority,
) -> WorkItem {
    let now_ms = panopticon_core::SystemClock.epoch_ms();
    WorkItem {
        id: WorkItemId::new(uuid::Uuid::new_v4().to_string()),
        kind: WorkItemKind::Task,
        priority,
        source: "cli".to_string(),
        payload: WorkItemPayload {
            issue_id: IssueId::new(issue_id),
            workspace,
            workspace_id: None,
            branch,
            custom_prompt,
        },
        created_at_ms: now_ms,
        expires_at_ms: None,
    }
}
