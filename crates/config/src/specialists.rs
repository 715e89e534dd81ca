// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command templates for waking specialists and worker agents — the
//! declarative piece of the "start a detached session running the
//! [specialist's|agent's] command" step.

use panopticon_core::SpecialistName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How to start (or resume) a given specialist's interactive process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialistCommand {
    /// Binary to exec, e.g. `"claude"`.
    pub command: String,
    /// Extra args appended before the task prompt, e.g. `["--dangerously-skip-permissions"]`.
    #[serde(default)]
    pub args: Vec<String>,
    /// Arg template used when resuming a session token, with `{token}`
    /// substituted, e.g. `["--resume", "{token}"]`.
    #[serde(default)]
    pub resume_args: Vec<String>,
}

impl SpecialistCommand {
    pub fn resume_args_for(&self, token: &str) -> Vec<String> {
        self.resume_args
            .iter()
            .map(|a| a.replace("{token}", token))
            .collect()
    }

    pub fn defaults() -> HashMap<SpecialistName, SpecialistCommand> {
        let mut map = HashMap::new();
        for name in SpecialistName::ALL {
            map.insert(
                name,
                SpecialistCommand {
                    command: "claude".to_string(),
                    args: vec!["--dangerously-skip-permissions".to_string()],
                    resume_args: vec!["--resume".to_string(), "{token}".to_string()],
                },
            );
        }
        map
    }
}

/// How to start a worker agent bound to an issue's workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerCommand {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub resume_args: Vec<String>,
}

impl WorkerCommand {
    pub fn resume_args_for(&self, token: &str) -> Vec<String> {
        self.resume_args
            .iter()
            .map(|a| a.replace("{token}", token))
            .collect()
    }
}

impl Default for WorkerCommand {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            args: vec!["--dangerously-skip-permissions".to_string()],
            resume_args: vec!["--resume".to_string(), "{token}".to_string()],
        }
    }
}
