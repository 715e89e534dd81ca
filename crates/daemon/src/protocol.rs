// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol between `pano` and `panod`.
//!
//! Wire format: 4-byte big-endian length prefix + JSON payload. This is the
//! daemon's only external surface — unlike the source's HTTP/JSON control
//! API, there is no listening TCP port and no webhook ingestion; a hook or
//! script that needs to reach the daemon goes through the `pano` binary.

use panopticon_core::{
    HealthRecord, OperationRecord, PendingQuestion, Priority, QuestionAnswer, ReviewStatus,
    SpecialistName, SpecialistRecord, WorkItem, WorkItemId, WorkerRuntimeState,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Protocol version, reported on `Hello` so a mismatched `pano`/`panod` pair
/// can be diagnosed instead of silently misinterpreting frames.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum single-frame size (64 MB — generous for an activity dump, far
/// below anything that would indicate a client bug).
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Per-request round-trip timeout.
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    Ping,
    Hello { version: String },
    Status,
    Shutdown,

    AgentList,
    AgentGet { agent_id: String },
    AgentSpawn {
        issue_id: String,
        workspace_path: PathBuf,
        #[serde(default = "default_runtime_kind")]
        runtime_kind: String,
        #[serde(default = "default_declared_model")]
        declared_model: String,
    },
    AgentKill { agent_id: String },
    AgentMessage { agent_id: String, text: String },
    AgentPoke { agent_id: String, message: Option<String> },
    AgentSuspend { agent_id: String, session_token: Option<String> },
    AgentResume { agent_id: String, message: Option<String> },
    AgentHandoff { agent_id: String, to_model: String, reason: Option<String> },
    AgentActivity { agent_id: String, #[serde(default = "default_activity_limit")] limit: usize },
    AgentHeartbeat {
        agent_id: String,
        state: WorkerRuntimeState,
        tool: Option<String>,
        session_id: Option<String>,
    },
    AgentPendingQuestions { agent_id: String },
    AgentAnswerQuestion { agent_id: String, answers: Vec<QuestionAnswer> },

    SpecialistList,
    SpecialistQueueList { name: SpecialistName },
    SpecialistQueuePush {
        name: SpecialistName,
        issue_id: String,
        workspace_path: PathBuf,
        branch: Option<String>,
        custom_prompt: Option<String>,
        #[serde(default = "default_priority")]
        priority: Priority,
    },
    SpecialistQueueRemove { name: SpecialistName, id: WorkItemId },
    SpecialistQueueReorder { name: SpecialistName, ids: Vec<WorkItemId> },
    SpecialistSuspend { name: SpecialistName },
    SpecialistResume { name: SpecialistName, message: Option<String> },
    SpecialistWake { name: SpecialistName },
    SpecialistReset { name: SpecialistName },
    SpecialistResetAll,
    SpecialistInit { name: SpecialistName },
    SpecialistDone {
        name: SpecialistName,
        issue_id: String,
        status: String,
        #[serde(default)]
        notes: String,
    },

    ReviewStart { issue_id: String, branch: Option<String> },
    ReviewStatusGet { issue_id: String },
    ReviewStatusAll,

    OperationsList,
}

fn default_runtime_kind() -> String {
    "claude-code".to_string()
}

fn default_declared_model() -> String {
    "default".to_string()
}

fn default_activity_limit() -> usize {
    50
}

fn default_priority() -> Priority {
    Priority::Normal
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Pong,
    Hello { version: String },
    Ok,
    ShuttingDown,
    Error { message: String },

    Status(DaemonStatus),
    Agent(AgentView),
    Agents(Vec<AgentView>),
    Activity(Vec<serde_json::Value>),
    PendingQuestions(Vec<PendingQuestion>),

    Specialists(Vec<SpecialistRecord>),
    Specialist(SpecialistRecord),
    Queue(Vec<WorkItem>),
    QueueItem(Option<WorkItem>),
    SpecialistWoke { queued: bool },

    ReviewStarted { queued: bool },
    ReviewStatus(Option<ReviewStatus>),
    ReviewStatuses(HashMap<String, ReviewStatus>),

    Operations(Vec<OperationRecord>),
}

/// View of a worker agent returned across the wire: the durable record plus
/// its cached health, rather than forcing the CLI to issue two calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentView {
    pub agent_id: String,
    pub issue_id: String,
    pub workspace_path: PathBuf,
    pub declared_model: String,
    pub health: Option<HealthRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonStatus {
    pub version: String,
    pub uptime_secs: u64,
    pub agent_count: usize,
    pub pending_operations: usize,
}

/// Errors from the wire-framing layer, distinct from application-level
/// `Response::Error` — these mean the connection itself is unusable.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },
    #[error("connection closed")]
    ConnectionClosed,
    #[error("timeout waiting for peer")]
    Timeout,
}

pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: json.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    Ok(json)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

pub async fn read_message<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(ProtocolError::Io(e)),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size: len, max: MAX_MESSAGE_SIZE });
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

pub async fn write_message<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    let len = data.len();
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size: len, max: MAX_MESSAGE_SIZE });
    }
    writer.write_all(&(len as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_request<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

pub async fn write_response<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: std::time::Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

pub async fn write_request<W: tokio::io::AsyncWriteExt + Unpin>(
    writer: &mut W,
    request: &Request,
    timeout: std::time::Duration,
) -> Result<(), ProtocolError> {
    let data = encode(request)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

pub async fn read_response<R: tokio::io::AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: std::time::Duration,
) -> Result<Response, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
