// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translates the lower-level `SessionError`/`StorageError` types into
//! `panopticon_core::EngineError` at the component boundaries that call
//! into adapters/storage.

use panopticon_adapters::agent::AgentError;
use panopticon_adapters::session::SessionError;
use panopticon_core::{EngineError, SessionErrorKind};
use panopticon_storage::StorageError;

pub(crate) fn session_err(e: SessionError) -> EngineError {
    match e {
        SessionError::NotFound(detail) => EngineError::session(SessionErrorKind::NotFound, detail),
        SessionError::SpawnFailed(detail) => EngineError::session(SessionErrorKind::Io, detail),
        SessionError::CommandFailed(detail) => EngineError::session(SessionErrorKind::Io, detail),
    }
}

/// Translates `AgentAdapter`'s Claude-Code-specific spawn/send/kill
/// failures into the same `EngineError::Session` kind the raw Session
/// Driver boundary uses — callers (health classification, the control
/// surface) don't need to distinguish "the tmux pane is gone" from "the
/// agent-specific handshake failed".
pub(crate) fn agent_err(e: AgentError) -> EngineError {
    match e {
        AgentError::NotFound(detail) => EngineError::session(SessionErrorKind::NotFound, detail),
        AgentError::SpawnFailed(detail)
        | AgentError::SendFailed(detail)
        | AgentError::KillFailed(detail)
        | AgentError::SessionError(detail)
        | AgentError::WorkspaceError(detail) => EngineError::session(SessionErrorKind::Io, detail),
    }
}

pub(crate) fn storage_err(e: StorageError) -> EngineError {
    match e {
        StorageError::Io(io) => EngineError::Io(io),
        StorageError::Json(json) => {
            EngineError::InvariantViolated(format!("corrupt persisted state: {json}"))
        }
        StorageError::NotFound(what) => EngineError::NotFound(what),
    }
}
