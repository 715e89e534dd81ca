// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Enumerated engine configuration: health thresholds, patrol interval,
//! activity retention, the circuit breaker ceiling, lock scope, and the
//! command templates used to wake worker agents and specialists. Loaded
//! from a TOML file so the daemon can run with zero configuration (every
//! field has a built-in default) while still letting operators override
//! any of it.

mod paths;
mod specialists;

pub use paths::PanopticonPaths;
pub use specialists::{SpecialistCommand, WorkerCommand};

use panopticon_core::{HealthThresholds, SpecialistName};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Lock scope. Only `process` is implemented — the mutation lock has no
/// durable form — but the field exists so the config shape documents the
/// constraint rather than leaving it implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockScope {
    #[default]
    Process,
}

/// Raw, serde-friendly mirror of [`EngineConfig`], used only at the TOML
/// boundary so every field can be optional there while the real config
/// carries built-in defaults.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    health_thresholds: RawHealthThresholds,
    #[serde(default)]
    patrol_interval_sec: Option<u64>,
    #[serde(default)]
    activity_retention: Option<usize>,
    #[serde(default)]
    circuit_breaker_max: Option<u32>,
    #[serde(default)]
    lock_scope: Option<LockScope>,
    #[serde(default)]
    specialists: HashMap<String, SpecialistCommand>,
    #[serde(default)]
    worker: Option<WorkerCommand>,
    #[serde(default)]
    answer_pacing_ms: Option<u64>,
    #[serde(default)]
    operation_ceiling_sec: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHealthThresholds {
    stale_sec: Option<u64>,
    warn_sec: Option<u64>,
    stuck_sec: Option<u64>,
}

/// The engine-wide configuration. Every field has a sensible default so a
/// daemon started with no `config.toml` present still runs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub health_thresholds: HealthThresholds,
    pub patrol_interval: Duration,
    pub activity_retention: usize,
    pub circuit_breaker_max: u32,
    pub lock_scope: LockScope,
    pub specialists: HashMap<SpecialistName, SpecialistCommand>,
    pub worker: WorkerCommand,
    /// Delay between keystrokes when answering a pending question.
    /// No justification for the 100ms default is on record; kept as a
    /// tunable rather than hardcoded.
    pub answer_pacing: Duration,
    /// T_op (Patrol step 5 / restart recovery): how long a `running`
    /// journal entry may persist before being rewritten to `failed`.
    pub operation_ceiling: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            health_thresholds: HealthThresholds::default(),
            patrol_interval: Duration::from_secs(30),
            activity_retention: 100,
            circuit_breaker_max: panopticon_core::AUTO_REQUEUE_LIMIT,
            lock_scope: LockScope::default(),
            specialists: SpecialistCommand::defaults(),
            worker: WorkerCommand::default(),
            answer_pacing: Duration::from_millis(100),
            operation_ceiling: Duration::from_secs(10 * 60),
        }
    }
}

impl EngineConfig {
    /// Load from `path`, falling back to defaults for any field the file
    /// omits. Missing file is not an error — it's the zero-config case.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let raw = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(config);
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let parsed: RawConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.apply(parsed);
        Ok(config)
    }

    fn apply(&mut self, raw: RawConfig) {
        if let Some(sec) = raw.health_thresholds.stale_sec {
            self.health_thresholds.stale = Duration::from_secs(sec);
        }
        if let Some(sec) = raw.health_thresholds.warn_sec {
            self.health_thresholds.warn = Duration::from_secs(sec);
        }
        if let Some(sec) = raw.health_thresholds.stuck_sec {
            self.health_thresholds.stuck = Duration::from_secs(sec);
        }
        if let Some(sec) = raw.patrol_interval_sec {
            self.patrol_interval = Duration::from_secs(sec);
        }
        if let Some(n) = raw.activity_retention {
            self.activity_retention = n;
        }
        if let Some(n) = raw.circuit_breaker_max {
            self.circuit_breaker_max = n;
        }
        if let Some(scope) = raw.lock_scope {
            self.lock_scope = scope;
        }
        for (name, cmd) in raw.specialists {
            if let Some(name) = SpecialistName::parse(&name) {
                self.specialists.insert(name, cmd);
            } else {
                tracing::warn!(name, "unknown specialist name in config, ignoring");
            }
        }
        if let Some(worker) = raw.worker {
            self.worker = worker;
        }
        if let Some(ms) = raw.answer_pacing_ms {
            self.answer_pacing = Duration::from_millis(ms);
        }
        if let Some(sec) = raw.operation_ceiling_sec {
            self.operation_ceiling = Duration::from_secs(sec);
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
