// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent State Store.
//!
//! Layout per agent: `{root}/<agent-id>/{state.json, health.json,
//! runtime.json, activity.ndjson, session-id}`. Every file is written
//! write-temp-then-rename; `activity.ndjson` is append-only and its readers
//! tolerate a torn trailing line.

use crate::atomic::{append_line, read_json_opt, write_json_atomic};
use crate::{StorageError, StorageResult};
use panopticon_core::{AgentId, AgentRecord, HealthRecord, RuntimeRecord};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Default number of activity entries retained per agent. Config may
/// override; the store itself just takes whatever limit the caller passes.
pub const DEFAULT_ACTIVITY_RETENTION: usize = 100;

#[derive(Clone)]
pub struct AgentStore {
    root: PathBuf,
}

impl AgentStore {
    /// `root` is the `agents/` directory (e.g. `~/.panopticon/agents`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir(&self, id: &AgentId) -> PathBuf {
        self.root.join(id.as_str())
    }

    fn state_path(&self, id: &AgentId) -> PathBuf {
        self.dir(id).join("state.json")
    }

    fn health_path(&self, id: &AgentId) -> PathBuf {
        self.dir(id).join("health.json")
    }

    fn runtime_path(&self, id: &AgentId) -> PathBuf {
        self.dir(id).join("runtime.json")
    }

    fn activity_path(&self, id: &AgentId) -> PathBuf {
        self.dir(id).join("activity.ndjson")
    }

    fn session_id_path(&self, id: &AgentId) -> PathBuf {
        self.dir(id).join("session-id")
    }

    /// The presence of a state directory does not imply a live session
    /// — this only answers "do we have durable state for this agent id".
    pub fn exists(&self, id: &AgentId) -> bool {
        self.dir(id).is_dir()
    }

    /// Enumerate every agent id with a state directory, regardless of
    /// liveness. Callers cross-reference against the Session Driver's
    /// `list()` to reconcile zombies.
    pub fn list_agent_ids(&self) -> StorageResult<Vec<AgentId>> {
        list_subdirs(&self.root).map(|names| names.into_iter().map(AgentId::new).collect())
    }

    pub fn load_state(&self, id: &AgentId) -> StorageResult<Option<AgentRecord>> {
        read_json_opt(&self.state_path(id))
    }

    pub fn save_state(&self, record: &AgentRecord) -> StorageResult<()> {
        write_json_atomic(&self.state_path(&record.id), record)
    }

    pub fn load_health(&self, id: &AgentId) -> StorageResult<Option<HealthRecord>> {
        read_json_opt(&self.health_path(id))
    }

    pub fn save_health(&self, id: &AgentId, record: &HealthRecord) -> StorageResult<()> {
        write_json_atomic(&self.health_path(id), record)
    }

    pub fn load_runtime(&self, id: &AgentId) -> StorageResult<RuntimeRecord> {
        Ok(read_json_opt(&self.runtime_path(id))?.unwrap_or_default())
    }

    pub fn save_runtime(&self, id: &AgentId, record: &RuntimeRecord) -> StorageResult<()> {
        write_json_atomic(&self.runtime_path(id), record)
    }

    /// Read-modify-write `state.json`, last-writer-wins (no cross-process
    /// locking; two concurrent merges may race, and the later write wins).
    pub fn merge_state(
        &self,
        id: &AgentId,
        f: impl FnOnce(&mut AgentRecord),
    ) -> StorageResult<AgentRecord> {
        let mut record = self
            .load_state(id)?
            .ok_or_else(|| StorageError::NotFound(format!("agent state for {id}")))?;
        f(&mut record);
        self.save_state(&record)?;
        Ok(record)
    }

    /// Read-modify-write `runtime.json` — the heartbeat sink, so a missing
    /// file is treated as a fresh default rather than an error.
    pub fn merge_runtime(
        &self,
        id: &AgentId,
        f: impl FnOnce(&mut RuntimeRecord),
    ) -> StorageResult<RuntimeRecord> {
        let mut record = self.load_runtime(id)?;
        f(&mut record);
        self.save_runtime(id, &record)?;
        Ok(record)
    }

    pub fn save_session_id(&self, id: &AgentId, session_id: &str) -> StorageResult<()> {
        let path = self.session_id_path(id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, session_id)?;
        Ok(())
    }

    pub fn read_session_id(&self, id: &AgentId) -> StorageResult<Option<String>> {
        match std::fs::read_to_string(self.session_id_path(id)) {
            Ok(s) => Ok(Some(s.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Append one activity entry, trimming the file down to `retention`
    /// entries (keeping the most recent) whenever the append would exceed
    /// it.
    pub fn append_activity(
        &self,
        id: &AgentId,
        entry: &Value,
        retention: usize,
    ) -> StorageResult<()> {
        let path = self.activity_path(id);
        let existing = read_activity_lines(&path)?;
        if existing.len() + 1 > retention && retention > 0 {
            let keep_from = existing.len() + 1 - retention;
            let trimmed: Vec<String> = existing
                .into_iter()
                .skip(keep_from)
                .map(|v| v.to_string())
                .collect();
            let mut content = trimmed.join("\n");
            if !content.is_empty() {
                content.push('\n');
            }
            content.push_str(&entry.to_string());
            content.push('\n');
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, content)?;
            Ok(())
        } else {
            append_line(&path, &entry.to_string())
        }
    }

    /// Most recent `limit` activity entries, newest last. Malformed or
    /// truncated lines (including a torn trailing write) are skipped
    /// silently rather than failing the whole read.
    pub fn read_activity(&self, id: &AgentId, limit: usize) -> StorageResult<Vec<Value>> {
        let mut lines = read_activity_lines(&self.activity_path(id))?;
        if lines.len() > limit {
            lines = lines.split_off(lines.len() - limit);
        }
        Ok(lines)
    }

    /// Remove the agent's entire state directory. Idempotent: a missing
    /// directory is not an error.
    pub fn purge(&self, id: &AgentId) -> StorageResult<()> {
        match std::fs::remove_dir_all(self.dir(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn read_activity_lines(path: &Path) -> StorageResult<Vec<Value>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    Ok(contents
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}

fn list_subdirs(root: &Path) -> StorageResult<Vec<String>> {
    let entries = match std::fs::read_dir(root) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
#[path = "agent_store_tests.rs"]
mod tests;
