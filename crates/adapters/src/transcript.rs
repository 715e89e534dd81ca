// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transcript Reader.
//!
//! Reads Claude Code's own append-only JSONL session transcripts — never
//! writes them. Two read paths:
//!
//! - [`find_active_transcript`] + [`collect_usage`]: token-usage accounting,
//!   summed across every transcript ever produced for a workspace (not just
//!   the active one), plus the first model identifier observed.
//! - [`find_pending_questions`]: `question-for-user` tool-uses with no
//!   matching tool-result yet, for the Pending-Question Broker.
//!
//! Deliberately does not infer agent health or completion state from
//! transcript content — that's the job of the heartbeat and
//! completion-report contracts. This module only ever extracts token counts
//! and pending questions.

use panopticon_core::{PendingQuestion, QuestionOption};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("no transcript directory found for session")]
    DirectoryNotFound,
    #[error("io error reading transcript: {0}")]
    Io(#[from] std::io::Error),
}

/// Summed token usage across a set of transcripts, plus the first model
/// identifier observed (models are not expected to change mid-conversation).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageSummary {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_write_tokens: u64,
    pub model: Option<String>,
}

/// Resolve the directory Claude Code writes session transcripts into for a
/// given project path: `$CLAUDE_CONFIG_DIR/projects/<mangled-path>` or
/// `~/.claude/projects/<mangled-path>` if the env var is unset.
///
/// Claude Code mangles the project path into a directory name by replacing
/// `/` and `.` with `-`.
pub fn transcript_dir_for(project_path: &Path) -> Option<PathBuf> {
    let claude_base = std::env::var("CLAUDE_CONFIG_DIR")
        .map(PathBuf::from)
        .ok()
        .or_else(|| dirs::home_dir().map(|h| h.join(".claude")))?;

    let mangled: String = project_path
        .to_string_lossy()
        .chars()
        .map(|c| if c == '/' || c == '.' { '-' } else { c })
        .collect();

    Some(claude_base.join("projects").join(mangled))
}

/// Find the active transcript for a session: among every `.jsonl` file in
/// the project's transcript directory, the one with the greatest
/// modification time. Falls back to matching by session id filename first,
/// since that's the common case right after spawn.
pub async fn find_active_transcript(
    project_path: &Path,
    session_id: &str,
) -> Result<PathBuf, TranscriptError> {
    let dir = transcript_dir_for(project_path).ok_or(TranscriptError::DirectoryNotFound)?;

    let by_session_id = dir.join(format!("{session_id}.jsonl"));
    if tokio::fs::try_exists(&by_session_id).await.unwrap_or(false) {
        return Ok(by_session_id);
    }

    most_recently_modified_jsonl(&dir)
        .await?
        .ok_or(TranscriptError::DirectoryNotFound)
}

async fn most_recently_modified_jsonl(dir: &Path) -> Result<Option<PathBuf>, TranscriptError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        let modified = entry.metadata().await?.modified()?;
        if newest.as_ref().map(|(t, _)| modified > *t).unwrap_or(true) {
            newest = Some((modified, path));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

/// Every `.jsonl` transcript in a workspace's transcript directory, for
/// usage accounting across the whole conversation history (not just the
/// currently active file).
pub async fn all_transcripts(project_path: &Path) -> Result<Vec<PathBuf>, TranscriptError> {
    let dir = transcript_dir_for(project_path).ok_or(TranscriptError::DirectoryNotFound)?;

    let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
            paths.push(path);
        }
    }
    Ok(paths)
}

/// Sum token usage across every transcript for a workspace.
pub async fn collect_usage(project_path: &Path) -> Result<UsageSummary, TranscriptError> {
    let mut summary = UsageSummary::default();
    for path in all_transcripts(project_path).await? {
        let Ok(contents) = tokio::fs::read_to_string(&path).await else {
            continue;
        };
        for line in non_truncated_lines(&contents) {
            let Ok(value) = serde_json::from_str::<Value>(line) else {
                continue;
            };
            accumulate_usage(&value, &mut summary);
        }
    }
    Ok(summary)
}

fn accumulate_usage(value: &Value, summary: &mut UsageSummary) {
    let Some(usage) = value.pointer("/message/usage") else {
        return;
    };
    summary.input_tokens += usage
        .get("input_tokens")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    summary.output_tokens += usage
        .get("output_tokens")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    summary.cache_read_tokens += usage
        .get("cache_read_input_tokens")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    summary.cache_write_tokens += usage
        .get("cache_creation_input_tokens")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    if summary.model.is_none() {
        if let Some(model) = value
            .pointer("/message/model")
            .and_then(Value::as_str)
        {
            summary.model = Some(model.to_string());
        }
    }
}

/// Split on newlines, discarding a final line that does not parse as JSON —
/// a transcript being written to concurrently can have a partial trailing
/// line, which must not corrupt the entries read so far.
fn non_truncated_lines(contents: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = contents.lines().filter(|l| !l.trim().is_empty()).collect();
    if let Some(last) = lines.last() {
        if serde_json::from_str::<Value>(last).is_err() {
            lines.pop();
        }
    }
    lines
}

/// Scan the active transcript for `question-for-user` tool-uses with no
/// matching `tool_result` later in the file.
pub async fn find_pending_questions(
    project_path: &Path,
    session_id: &str,
) -> Result<Vec<PendingQuestion>, TranscriptError> {
    let path = find_active_transcript(project_path, session_id).await?;
    let contents = tokio::fs::read_to_string(&path).await?;
    Ok(pending_questions_in(&contents))
}

fn pending_questions_in(contents: &str) -> Vec<PendingQuestion> {
    let mut asked: Vec<PendingQuestion> = Vec::new();
    let mut answered = std::collections::HashSet::new();

    for line in non_truncated_lines(contents) {
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            continue;
        };

        if let Some(tool_use_id) = value.get("tool_use_id").and_then(Value::as_str) {
            answered.insert(tool_use_id.to_string());
            continue;
        }

        let Some(content) = value.pointer("/message/content").and_then(Value::as_array) else {
            continue;
        };

        for block in content {
            if block.get("type").and_then(Value::as_str) != Some("tool_use") {
                continue;
            }
            if block.get("name").and_then(Value::as_str) != Some("question-for-user") {
                continue;
            }
            let Some(tool_id) = block.get("id").and_then(Value::as_str) else {
                continue;
            };
            let input = block.get("input").cloned().unwrap_or(Value::Null);
            let prompt = input
                .get("question")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let options = input
                .get("options")
                .and_then(Value::as_array)
                .map(|opts| {
                    opts.iter()
                        .map(|o| QuestionOption {
                            label: o
                                .get("label")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                            description: o
                                .get("description")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            let multi_select = input
                .get("multiSelect")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let timestamp = value
                .get("timestamp")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            asked.push(PendingQuestion {
                tool_id: tool_id.to_string(),
                timestamp,
                prompt,
                options,
                multi_select,
            });
        }
    }

    asked.retain(|q| !answered.contains(&q.tool_id));
    asked
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
