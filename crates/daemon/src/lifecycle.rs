// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup/shutdown: single-instance lock acquisition, directory
//! layout, and construction of every engine component with its concrete
//! adapter stack.
//!
//! Lock acquisition order matters: the lock file is opened without
//! truncating, locked, and only then truncated and rewritten with the new
//! PID. Truncating first would wipe a running daemon's PID out from under
//! it the moment a second `panod` process loses the race.

use fs2::FileExt;
use panopticon_adapters::agent::ClaudeAgentAdapter;
use panopticon_adapters::session::TmuxAdapter;
use panopticon_adapters::traced::{TracedAgent, TracedSession};
use panopticon_adapters::upstream::{NoOpBranchPusher, NoOpIssueTracker};
use panopticon_config::{EngineConfig, PanopticonPaths};
use panopticon_core::{SystemClock, UuidIdGen};
use panopticon_engine::lock::GlobalMutationLock;
use panopticon_engine::patrol::PatrolLoop;
use panopticon_engine::pipeline::PipelineController;
use panopticon_engine::questions::QuestionBroker;
use panopticon_engine::specialists::SpecialistRegistry;
use panopticon_engine::workers::WorkerSupervisor;
use panopticon_storage::{AgentStore, OperationJournal, ReviewStatusStore, SpecialistStore};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;

pub type DaemonSessionAdapter = TracedSession<TmuxAdapter>;
pub type DaemonAgentAdapter = TracedAgent<ClaudeAgentAdapter<DaemonSessionAdapter>>;

pub type DaemonWorkers = WorkerSupervisor<DaemonAgentAdapter, SystemClock>;
pub type DaemonSpecialists = SpecialistRegistry<DaemonSessionAdapter, SystemClock>;
pub type DaemonPipeline = PipelineController<
    DaemonAgentAdapter,
    DaemonSessionAdapter,
    SystemClock,
    NoOpIssueTracker,
    NoOpBranchPusher,
    UuidIdGen,
>;
pub type DaemonPatrol = PatrolLoop<DaemonSessionAdapter, SystemClock>;
pub type DaemonQuestions = QuestionBroker<DaemonSessionAdapter>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("another panod instance is already running (pid {pid})")]
    AlreadyRunning { pid: String },
    #[error("failed to acquire lock file {path}: {source}")]
    LockIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to bind socket {path}: {source}")]
    Bind {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("config error: {0}")]
    Config(#[from] panopticon_config::ConfigError),
}

/// Holds the daemon's engine components plus the lock file handle that must
/// outlive the process — dropping it releases the advisory lock.
pub struct Daemon {
    pub paths: PanopticonPaths,
    pub config: EngineConfig,
    pub workers: DaemonWorkers,
    pub specialists: DaemonSpecialists,
    pub pipeline: Arc<DaemonPipeline>,
    pub patrol: Arc<DaemonPatrol>,
    pub questions: DaemonQuestions,
    pub started_at_ms: u64,
    _lock_file: File,
}

impl Daemon {
    /// Acquire the single-instance lock, lay out directories, and construct
    /// the full engine component graph. Binds nothing — the caller binds
    /// the Unix socket itself, last, once this returns successfully.
    pub fn startup(paths: PanopticonPaths) -> Result<Self, LifecycleError> {
        std::fs::create_dir_all(paths.root()).map_err(|source| LifecycleError::CreateDir {
            path: paths.root().display().to_string(),
            source,
        })?;

        let lock_file = acquire_lock(&paths)?;

        std::fs::create_dir_all(paths.agents_dir()).map_err(|source| LifecycleError::CreateDir {
            path: paths.agents_dir().display().to_string(),
            source,
        })?;
        std::fs::create_dir_all(paths.specialists_dir()).map_err(|source| {
            LifecycleError::CreateDir {
                path: paths.specialists_dir().display().to_string(),
                source,
            }
        })?;

        let config = EngineConfig::load(&PanopticonPaths::config_file())?;

        let clock = SystemClock;
        let lock = GlobalMutationLock::new();

        let session_adapter = TracedSession::new(TmuxAdapter::new());
        let agent_adapter = TracedAgent::new(ClaudeAgentAdapter::new(session_adapter.clone()));

        let agent_store = AgentStore::new(paths.agents_dir());
        let specialist_store = SpecialistStore::new(paths.specialists_dir());
        let reviews = ReviewStatusStore::open(paths.review_status_file())
            .map_err(|e| LifecycleError::CreateDir {
                path: paths.review_status_file().display().to_string(),
                source: std::io::Error::other(e.to_string()),
            })?;
        let journal = OperationJournal::open(paths.pending_operations_file()).map_err(|e| {
            LifecycleError::CreateDir {
                path: paths.pending_operations_file().display().to_string(),
                source: std::io::Error::other(e.to_string()),
            }
        })?;

        let workers = WorkerSupervisor::new(
            agent_store.clone(),
            agent_adapter.clone(),
            lock.clone(),
            clock.clone(),
            config.worker.clone(),
            config.activity_retention,
        );

        let specialists = SpecialistRegistry::new(
            specialist_store.clone(),
            session_adapter.clone(),
            lock.clone(),
            clock.clone(),
            config.specialists.clone(),
        );

        let pipeline = PipelineController::new(
            reviews,
            specialists.clone(),
            workers.clone(),
            NoOpIssueTracker::new(),
            NoOpBranchPusher::new(),
            UuidIdGen,
            clock.clone(),
            lock.clone(),
        );

        let patrol = PatrolLoop::new(
            agent_store.clone(),
            session_adapter.clone(),
            specialists.clone(),
            journal,
            clock.clone(),
            config.health_thresholds.clone(),
            config.operation_ceiling,
        );

        let questions = QuestionBroker::new(agent_store, session_adapter, config.answer_pacing);

        Ok(Self {
            paths,
            config,
            workers,
            specialists,
            pipeline: Arc::new(pipeline),
            patrol: Arc::new(patrol),
            questions,
            started_at_ms: clock.epoch_ms(),
            _lock_file: lock_file,
        })
    }

    /// Remove the socket and lock files. Best-effort: a file already gone
    /// is not an error (idempotent shutdown, same as the control-surface
    /// operations themselves).
    pub fn shutdown(&self) {
        let _ = std::fs::remove_file(self.paths.socket_file());
        let _ = std::fs::remove_file(self.paths.lock_file());
    }
}

/// Open without truncating, lock exclusively, then (only once the lock is
/// ours) truncate and write the current PID.
fn acquire_lock(paths: &PanopticonPaths) -> Result<File, LifecycleError> {
    let lock_path = paths.lock_file();
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|source| LifecycleError::LockIo {
            path: lock_path.display().to_string(),
            source,
        })?;

    if file.try_lock_exclusive().is_err() {
        let existing = std::fs::read_to_string(&lock_path).unwrap_or_default();
        let pid = existing.lines().next().unwrap_or("unknown").to_string();
        return Err(LifecycleError::AlreadyRunning { pid });
    }

    let mut file = file;
    file.set_len(0).map_err(|source| LifecycleError::LockIo {
        path: lock_path.display().to_string(),
        source,
    })?;
    use std::io::Seek;
    file.seek(std::io::SeekFrom::Start(0))
        .map_err(|source| LifecycleError::LockIo {
            path: lock_path.display().to_string(),
            source,
        })?;
    writeln!(file, "{}", std::process::id()).map_err(|source| LifecycleError::LockIo {
        path: lock_path.display().to_string(),
        source,
    })?;
    file.sync_all().ok();
    Ok(file)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
