// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Claude agent adapter implementation

use super::{AgentAdapter, AgentError, AgentHandle, AgentReconnectConfig, AgentSpawnConfig};
use crate::session::SessionAdapter;
use async_trait::async_trait;
use panopticon_core::AgentId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Extract the binary basename from a command string.
///
/// Handles absolute paths (`/usr/bin/claude` → `claude`), relative paths
/// (`./claude` → `claude`), and plain names (`claudeless` → `claudeless`).
/// Falls back to `"claude"` for empty strings.
pub fn extract_process_name(command: &str) -> String {
    command
        .split_whitespace()
        .next()
        .and_then(|first| first.rsplit('/').next())
        .unwrap_or("claude")
        .to_string()
}

/// Augment a claude command to add `--allow-dangerously-skip-permissions` if
/// `--dangerously-skip-permissions` is present but the allow flag is not.
fn augment_command_for_skip_permissions(command: &str) -> String {
    if command.contains("--dangerously-skip-permissions")
        && !command.contains("--allow-dangerously-skip-permissions")
    {
        format!("{} --allow-dangerously-skip-permissions", command)
    } else {
        command.to_string()
    }
}

/// Result of checking for the bypass permissions prompt
#[derive(Debug, PartialEq)]
enum BypassPromptResult {
    Accepted,
    NotPresent,
    Unexpected(String),
}

/// Check for and auto-accept the bypass permissions confirmation prompt.
///
/// Claude Code with `--dangerously-skip-permissions` shows an interactive dialog:
/// ```text
/// WARNING: Claude Code running in Bypass Permissions mode
/// ...
/// ❯ 1. No, exit
///   2. Yes, I accept
/// ```
async fn handle_bypass_permissions_prompt<S: SessionAdapter>(
    sessions: &S,
    session_id: &str,
    max_attempts: usize,
) -> Result<BypassPromptResult, AgentError> {
    let check_interval = Duration::from_millis(200);

    for attempt in 0..max_attempts {
        if attempt > 0 {
            tokio::time::sleep(check_interval).await;
        }

        let output = match sessions.capture_output(session_id, 50).await {
            Ok(out) => out,
            Err(_) => continue,
        };

        let has_bypass_warning = output.contains("Bypass Permissions mode");
        let has_no_option = output.contains("1. No");
        let has_yes_option = output.contains("2. Yes");

        if has_bypass_warning && has_no_option && has_yes_option {
            tracing::info!(
                session_id,
                "detected bypass permissions prompt, sending '2' to accept"
            );
            sessions
                .send(session_id, "2")
                .await
                .map_err(|e| AgentError::SendFailed(e.to_string()))?;
            return Ok(BypassPromptResult::Accepted);
        }

        if output.contains("Error:") || output.contains("error:") {
            return Ok(BypassPromptResult::Unexpected(output));
        }
    }

    Ok(BypassPromptResult::NotPresent)
}

/// Result of checking for the workspace trust prompt
#[derive(Debug, PartialEq)]
enum WorkspaceTrustResult {
    Accepted,
    NotPresent,
    Unexpected(String),
}

/// Check for and auto-accept the workspace trust prompt.
///
/// Claude Code shows an interactive dialog when accessing a workspace:
/// ```text
/// Accessing workspace:
/// /path/to/project
/// ...
/// ❯ 1. Yes, I trust this folder
///   2. No, exit
/// ```
async fn handle_workspace_trust_prompt<S: SessionAdapter>(
    sessions: &S,
    session_id: &str,
    max_attempts: usize,
) -> Result<WorkspaceTrustResult, AgentError> {
    let check_interval = Duration::from_millis(200);

    for attempt in 0..max_attempts {
        if attempt > 0 {
            tokio::time::sleep(check_interval).await;
        }

        let output = match sessions.capture_output(session_id, 50).await {
            Ok(out) => out,
            Err(_) => continue,
        };

        let has_workspace_msg = output.contains("Accessing workspace");
        let has_yes_option = output.contains("1. Yes");
        let has_no_option = output.contains("2. No");

        if has_workspace_msg && has_yes_option && has_no_option {
            tracing::info!(
                session_id,
                "detected workspace trust prompt, sending '1' to trust"
            );
            sessions
                .send(session_id, "1")
                .await
                .map_err(|e| AgentError::SendFailed(e.to_string()))?;
            return Ok(WorkspaceTrustResult::Accepted);
        }

        if output.contains("Error:") || output.contains("error:") {
            return Ok(WorkspaceTrustResult::Unexpected(output));
        }
    }

    Ok(WorkspaceTrustResult::NotPresent)
}

/// Result of checking for the login/onboarding prompt
#[derive(Debug, PartialEq)]
enum LoginPromptResult {
    Detected,
    NotPresent,
}

/// Check for the Claude Code login/onboarding prompt. When Claude Code is
/// not authenticated, it shows a dialog asking the user to select a login
/// method; the agent cannot proceed and should fail with a clear error.
async fn handle_login_prompt<S: SessionAdapter>(
    sessions: &S,
    session_id: &str,
    max_attempts: usize,
) -> Result<LoginPromptResult, AgentError> {
    let check_interval = Duration::from_millis(200);

    for attempt in 0..max_attempts {
        if attempt > 0 {
            tokio::time::sleep(check_interval).await;
        }

        let output = match sessions.capture_output(session_id, 50).await {
            Ok(out) => out,
            Err(_) => continue,
        };

        if output.contains("Select login method") || output.contains("Choose the text style") {
            return Ok(LoginPromptResult::Detected);
        }
    }

    Ok(LoginPromptResult::NotPresent)
}

/// Agent adapter for Claude Code
#[derive(Clone)]
pub struct ClaudeAgentAdapter<S: SessionAdapter> {
    sessions: S,
    agents: Arc<Mutex<HashMap<AgentId, AgentInfo>>>,
}

#[derive(Clone)]
struct AgentInfo {
    session_id: String,
    workspace_path: PathBuf,
}

impl<S: SessionAdapter> ClaudeAgentAdapter<S> {
    pub fn new(sessions: S) -> Self {
        Self {
            sessions,
            agents: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn prompt_poll_max_attempts(&self) -> usize {
        crate::env::prompt_poll_max_attempts()
    }

    /// Register a fake agent for testing (bypasses spawn).
    #[cfg(test)]
    fn register_test_agent(&self, agent_id: &AgentId, session_id: &str) {
        self.agents.lock().insert(
            agent_id.clone(),
            AgentInfo {
                session_id: session_id.to_string(),
                workspace_path: PathBuf::new(),
            },
        );
    }
}

#[async_trait]
impl<S: SessionAdapter> AgentAdapter for ClaudeAgentAdapter<S> {
    async fn spawn(&self, config: AgentSpawnConfig) -> Result<AgentHandle, AgentError> {
        tracing::debug!(
            agent_id = %config.agent_id,
            workspace_path = %config.workspace_path.display(),
            "spawning agent"
        );

        if let Some(ref cwd) = config.cwd {
            if !cwd.exists() {
                return Err(AgentError::SpawnFailed(format!(
                    "working directory does not exist: {}",
                    cwd.display()
                )));
            }
        }

        prepare_workspace(&config.workspace_path, &config.project_root)
            .await
            .map_err(|e| AgentError::WorkspaceError(e.to_string()))?;

        let cwd = config
            .cwd
            .clone()
            .unwrap_or_else(|| config.workspace_path.clone());

        let mut command = config.command.clone();
        for arg in &config.args {
            command.push(' ');
            command.push_str(arg);
        }
        let command = augment_command_for_skip_permissions(&command);

        let spawned_id = self
            .sessions
            .spawn(config.agent_id.as_str(), &cwd, &command, &config.env)
            .await
            .map_err(|e| AgentError::SessionError(e.to_string()))?;

        tracing::info!(
            agent_id = %config.agent_id,
            session_id = %spawned_id,
            "agent session spawned"
        );

        let max_attempts = self.prompt_poll_max_attempts();

        if command.contains("--dangerously-skip-permissions") {
            match handle_bypass_permissions_prompt(&self.sessions, &spawned_id, max_attempts)
                .await?
            {
                BypassPromptResult::Accepted => {
                    tracing::info!(agent_id = %config.agent_id, "bypass permissions prompt accepted");
                }
                BypassPromptResult::NotPresent => {
                    tracing::debug!(agent_id = %config.agent_id, "no bypass permissions prompt detected");
                }
                BypassPromptResult::Unexpected(output) => {
                    tracing::warn!(
                        agent_id = %config.agent_id,
                        output = %output,
                        "unexpected output while checking for bypass permissions prompt"
                    );
                }
            }
        }

        match handle_workspace_trust_prompt(&self.sessions, &spawned_id, max_attempts).await? {
            WorkspaceTrustResult::Accepted => {
                tracing::info!(agent_id = %config.agent_id, "workspace trust prompt accepted");
            }
            WorkspaceTrustResult::NotPresent => {
                tracing::debug!(agent_id = %config.agent_id, "no workspace trust prompt detected");
            }
            WorkspaceTrustResult::Unexpected(output) => {
                tracing::warn!(
                    agent_id = %config.agent_id,
                    output = %output,
                    "unexpected output while checking for workspace trust prompt"
                );
            }
        }

        if let LoginPromptResult::Detected =
            handle_login_prompt(&self.sessions, &spawned_id, max_attempts).await?
        {
            tracing::error!(
                agent_id = %config.agent_id,
                "Claude Code is not authenticated — login/onboarding prompt detected"
            );
            let _ = self.sessions.kill(&spawned_id).await;
            return Err(AgentError::SpawnFailed(
                "Claude Code is not authenticated. Run `claude` once manually to complete setup."
                    .to_string(),
            ));
        }

        self.agents.lock().insert(
            config.agent_id.clone(),
            AgentInfo {
                session_id: spawned_id.clone(),
                workspace_path: config.workspace_path.clone(),
            },
        );

        if !config.prompt.is_empty() {
            AgentAdapter::send(self, &config.agent_id, &config.prompt).await?;
        }

        Ok(AgentHandle::new(
            config.agent_id,
            spawned_id,
            config.workspace_path,
        ))
    }

    async fn reconnect(&self, config: AgentReconnectConfig) -> Result<AgentHandle, AgentError> {
        tracing::debug!(
            agent_id = %config.agent_id,
            session_id = %config.session_id,
            workspace_path = %config.workspace_path.display(),
            "reconnecting to existing agent session"
        );

        if !self
            .sessions
            .exists(&config.session_id)
            .await
            .map_err(|e| AgentError::SessionError(e.to_string()))?
        {
            return Err(AgentError::NotFound(config.session_id));
        }

        self.agents.lock().insert(
            config.agent_id.clone(),
            AgentInfo {
                session_id: config.session_id.clone(),
                workspace_path: config.workspace_path.clone(),
            },
        );

        Ok(AgentHandle::new(
            config.agent_id,
            config.session_id,
            config.workspace_path,
        ))
    }

    async fn send(&self, agent_id: &AgentId, input: &str) -> Result<(), AgentError> {
        let session_id = {
            let agents = self.agents.lock();
            agents
                .get(agent_id)
                .map(|info| info.session_id.clone())
                .ok_or_else(|| AgentError::NotFound(agent_id.to_string()))?
        };

        let key_pause = Duration::from_millis(50);

        // Clear current input: Esc, pause, Esc
        self.sessions
            .send(&session_id, "Escape")
            .await
            .map_err(|e| AgentError::SendFailed(e.to_string()))?;
        tokio::time::sleep(key_pause).await;
        self.sessions
            .send(&session_id, "Escape")
            .await
            .map_err(|e| AgentError::SendFailed(e.to_string()))?;
        tokio::time::sleep(key_pause).await;

        self.sessions
            .send_literal(&session_id, input)
            .await
            .map_err(|e| AgentError::SendFailed(e.to_string()))?;

        // Wait for the TUI to process all characters before pressing Enter.
        // Scale the delay with input length: the TUI re-renders per keystroke,
        // so longer messages need more time. Base 100ms, +1ms per char, cap 2s.
        let text_settle = Duration::from_millis((100 + input.len() as u64).min(2000));
        tokio::time::sleep(text_settle).await;

        self.sessions
            .send_enter(&session_id)
            .await
            .map_err(|e| AgentError::SendFailed(e.to_string()))
    }

    async fn kill(&self, agent_id: &AgentId) -> Result<(), AgentError> {
        let session_id = {
            let mut agents = self.agents.lock();
            agents
                .remove(agent_id)
                .ok_or_else(|| AgentError::NotFound(agent_id.to_string()))?
                .session_id
        };

        self.sessions
            .kill(&session_id)
            .await
            .map_err(|e| AgentError::KillFailed(e.to_string()))
    }
}

/// Prepare workspace for agent execution
async fn prepare_workspace(workspace_path: &Path, project_root: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(workspace_path).await?;

    let project_settings = project_root.join(".claude/settings.json");
    if tokio::fs::try_exists(&project_settings)
        .await
        .unwrap_or(false)
    {
        let claude_dir = workspace_path.join(".claude");
        tokio::fs::create_dir_all(&claude_dir).await?;
        tokio::fs::copy(&project_settings, claude_dir.join("settings.local.json")).await?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
