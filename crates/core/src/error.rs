// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Central error taxonomy. Every collaborator boundary translates its
//! own failures into one of these kinds rather than leaking library error
//! types across crates.

use thiserror::Error;

/// `SessionError` detail, reported by the Session Driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    NotFound,
    Timeout,
    Io,
}

impl std::fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionErrorKind::NotFound => "not_found",
            SessionErrorKind::Timeout => "timeout",
            SessionErrorKind::Io => "io",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Agent, specialist, or issue unknown. Surfaced to the caller, never
    /// retried internally.
    #[error("not found: {0}")]
    NotFound(String),

    /// Singleton invariant violation. The caller typically enqueues
    /// instead of treating this as fatal.
    #[error("already running: {0}")]
    AlreadyRunning(String),

    /// A human-initiated review start found a terminal blocked/failed
    /// review still carrying unread notes. Carries the notes so the
    /// control surface can echo them back to the caller.
    #[error("review already has unread notes pending human action: {0}")]
    AlreadyReviewedNeedsAction(String),

    /// Global Mutation Lock already held. Equivalent to an HTTP 423;
    /// the control surface reports it as a distinct, retriable condition.
    #[error("lock busy: {0}")]
    LockBusy(String),

    /// Session Driver failure. Non-fatal: logged, and the affected
    /// agent's next health classification reflects it as `warning`.
    #[error("session error ({kind}): {detail}")]
    Session {
        kind: SessionErrorKind,
        detail: String,
    },

    /// Transcript Reader failure. Transient: reads return empty and
    /// classification degrades gracefully rather than failing the request.
    #[error("transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    /// Upstream issue tracker call failed. Non-fatal: the triggering
    /// operation continues and the Operation Journal retains a
    /// `failed` entry for operator follow-up.
    #[error("upstream tracker error: {0}")]
    UpstreamTrackerError(String),

    /// Programmer error — an invariant the engine assumes can never be
    /// false was false. Never tears down the whole engine; the offending
    /// request fails and the violation is logged for investigation.
    #[error("invariant violated: {0}")]
    InvariantViolated(String),

    /// Escape hatch for I/O and (de)serialization failures at storage
    /// boundaries that don't fit a more specific kind above.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn not_found(what: impl Into<String>) -> Self {
        EngineError::NotFound(what.into())
    }

    pub fn session(kind: SessionErrorKind, detail: impl Into<String>) -> Self {
        EngineError::Session {
            kind,
            detail: detail.into(),
        }
    }

    /// Whether this kind represents a condition the caller can reasonably
    /// retry (as opposed to one that requires a different request shape).
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            EngineError::LockBusy(_)
                | EngineError::Session { .. }
                | EngineError::TranscriptUnavailable(_)
                | EngineError::UpstreamTrackerError(_)
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
