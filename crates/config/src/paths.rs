// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem layout rooted at `~/.panopticon` (overridable via
//! `PANOPTICON_HOME`).

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PanopticonPaths {
    root: PathBuf,
}

impl PanopticonPaths {
    /// Resolve the root directory: `PANOPTICON_HOME` env var if set,
    /// otherwise `~/.panopticon`.
    pub fn resolve() -> Self {
        let root = std::env::var_os("PANOPTICON_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".panopticon")
            });
        Self { root }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.root.join("agents")
    }

    pub fn agent_dir(&self, agent_id: &str) -> PathBuf {
        self.agents_dir().join(agent_id)
    }

    pub fn specialists_dir(&self) -> PathBuf {
        self.root.join("specialists")
    }

    pub fn specialist_dir(&self, name: &str) -> PathBuf {
        self.specialists_dir().join(name)
    }

    pub fn review_status_file(&self) -> PathBuf {
        self.root.join("review-status.json")
    }

    pub fn pending_operations_file(&self) -> PathBuf {
        self.root.join("pending-operations.json")
    }

    /// Resolve the config file path: `PANOPTICON_CONFIG` env var if set,
    /// otherwise `{root}/config.toml`.
    pub fn config_file() -> PathBuf {
        std::env::var_os("PANOPTICON_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::resolve().root.join("config.toml"))
    }

    pub fn daemon_log_file(&self) -> PathBuf {
        self.root.join("daemon.log")
    }

    pub fn socket_file(&self) -> PathBuf {
        self.root.join("daemon.sock")
    }

    pub fn lock_file(&self) -> PathBuf {
        self.root.join("daemon.lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_dir_nests_under_agents() {
        let paths = PanopticonPaths::with_root("/tmp/pano-test");
        assert_eq!(
            paths.agent_dir("agent-pan-100"),
            PathBuf::from("/tmp/pano-test/agents/agent-pan-100")
        );
    }

    #[test]
    fn specialist_dir_nests_under_specialists() {
        let paths = PanopticonPaths::with_root("/tmp/pano-test");
        assert_eq!(
            paths.specialist_dir("review-agent"),
            PathBuf::from("/tmp/pano-test/specialists/review-agent")
        );
    }
}
