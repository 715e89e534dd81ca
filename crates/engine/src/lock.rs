// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global Mutation Lock: a process-wide, non-reentrant, try-acquire
//! mutex serializing any operation that resumes or newly attaches to an
//! upstream provider session. Held only across the brief critical
//! section that issues the session-resume call — never across the whole
//! request — and released before the caller awaits further I/O.

use panopticon_core::EngineError;
use parking_lot::Mutex;
use std::sync::Arc;

struct LockState {
    held_by: Option<String>,
}

/// Cloneable handle to the single process-wide lock. Cloning shares the
/// same underlying mutex (`Arc`), matching how the daemon hands the same
/// lock to every component that needs it.
#[derive(Clone)]
pub struct GlobalMutationLock {
    state: Arc<Mutex<LockState>>,
}

impl Default for GlobalMutationLock {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalMutationLock {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LockState { held_by: None })),
        }
    }

    /// Try to acquire the lock for `description` (used for diagnostics —
    /// e.g. "wake review-agent for PAN-100"). Fails immediately with
    /// `LockBusy` if already held; never blocks.
    pub fn try_acquire(&self, description: impl Into<String>) -> Result<LockGuard, EngineError> {
        let mut state = self.state.lock();
        if let Some(holder) = &state.held_by {
            return Err(EngineError::LockBusy(holder.clone()));
        }
        let description = description.into();
        state.held_by = Some(description.clone());
        Ok(LockGuard {
            state: self.state.clone(),
            description,
        })
    }

    /// Whether the lock is currently held, and by whom.
    pub fn held_by(&self) -> Option<String> {
        self.state.lock().held_by.clone()
    }
}

/// RAII guard releasing the lock on drop. Holding this across an `.await`
/// is intentional for the duration of the session-resume call it guards,
/// but callers must drop it before any further unrelated awaiting.
pub struct LockGuard {
    state: Arc<Mutex<LockState>>,
    description: String,
}

impl LockGuard {
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.state.lock().held_by = None;
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
