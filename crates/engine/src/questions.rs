// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-Question Broker: detects unanswered structured questions
//! in a worker agent's transcript and maps human answers back to
//! keystrokes delivered through the session driver.
//!
//! Delivery is best-effort — verification is by the transcript acquiring a
//! matching tool-result on a subsequent read, not by anything this module
//! confirms synchronously.

use crate::convert::{session_err, storage_err};
use panopticon_adapters::session::SessionAdapter;
use panopticon_adapters::transcript::{find_pending_questions, TranscriptError};
use panopticon_core::{AgentId, EngineError, EngineResult, PendingQuestion, QuestionAnswer};
use panopticon_storage::AgentStore;
use std::time::Duration;

pub struct QuestionBroker<S: SessionAdapter> {
    store: AgentStore,
    sessions: S,
    answer_pacing: Duration,
}

impl<S: SessionAdapter> QuestionBroker<S> {
    pub fn new(store: AgentStore, sessions: S, answer_pacing: Duration) -> Self {
        Self {
            store,
            sessions,
            answer_pacing,
        }
    }

    /// List unanswered `question-for-user` tool-uses in the agent's active
    /// transcript. A transcript that doesn't exist yet degrades to an empty
    /// list rather than an error — reads return empty.
    pub async fn pending(&self, agent_id: &AgentId) -> EngineResult<Vec<PendingQuestion>> {
        let state = self
            .store
            .load_state(agent_id)
            .map_err(storage_err)?
            .ok_or_else(|| EngineError::not_found(format!("agent {agent_id}")))?;
        let runtime = self.store.load_runtime(agent_id).map_err(storage_err)?;
        let Some(session_id) = runtime.session_id.or(state.session_token) else {
            return Ok(Vec::new());
        };

        match find_pending_questions(&state.workspace_path, &session_id).await {
            Ok(questions) => Ok(questions),
            Err(TranscriptError::DirectoryNotFound) => Ok(Vec::new()),
            Err(e) => Err(EngineError::TranscriptUnavailable(e.to_string())),
        }
    }

    /// Answer one or more pending questions. For each answer: send the
    /// 1-based option number matching its label; if the label doesn't
    /// match any option, send the synthetic "custom" choice number and then
    /// type the free-text answer. Between questions, send Tab; after the
    /// last answer, send Enter. A pacing delay between keystrokes survives
    /// terminal echo quirks (tunable; the 100ms default is inherited
    /// verbatim from the source with no given justification).
    pub async fn answer(&self, agent_id: &AgentId, answers: &[QuestionAnswer]) -> EngineResult<()> {
        let pending = self.pending(agent_id).await?;
        let tmux_session_id = format!("pano-{}", agent_id.as_str());

        for (i, answer) in answers.iter().enumerate() {
            let question = pending
                .iter()
                .find(|q| q.tool_id == answer.tool_id)
                .ok_or_else(|| {
                    EngineError::not_found(format!("pending question {}", answer.tool_id))
                })?;

            match question.option_index(&answer.answer) {
                Some(idx) => {
                    self.sessions
                        .send(&tmux_session_id, &idx.to_string())
                        .await
                        .map_err(session_err)?;
                }
                None => {
                    let custom = question.custom_choice_index();
                    self.sessions
                        .send(&tmux_session_id, &custom.to_string())
                        .await
                        .map_err(session_err)?;
                    tokio::time::sleep(self.answer_pacing).await;
                    self.sessions
                        .send_literal(&tmux_session_id, &answer.answer)
                        .await
                        .map_err(session_err)?;
                }
            }

            tokio::time::sleep(self.answer_pacing).await;
            if i + 1 < answers.len() {
                self.sessions
                    .send(&tmux_session_id, "Tab")
                    .await
                    .map_err(session_err)?;
                tokio::time::sleep(self.answer_pacing).await;
            }
        }

        self.sessions
            .send_enter(&tmux_session_id)
            .await
            .map_err(session_err)
    }
}

#[cfg(test)]
#[path = "questions_tests.rs"]
mod tests;
