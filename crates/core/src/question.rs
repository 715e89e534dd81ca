// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-Question Broker data shapes: the structured multi-choice
//! question a worker agent emits into its transcript as a tool-use, and the
//! human's answer to it.

use serde::{Deserialize, Serialize};

/// One selectable option on a pending question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// A single structured question extracted from a `question-for-user`
/// tool-use that has no matching tool-result yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQuestion {
    /// Tool-use id, used to correlate with a later tool-result.
    pub tool_id: String,
    pub timestamp: String,
    pub prompt: String,
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub multi_select: bool,
}

/// A human's answer to one pending question, as delivered to
/// `POST /agents/:id/answer-question`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub tool_id: String,
    /// Free text matched against `options[].label`; if no option matches,
    /// the broker falls back to the "custom" choice plus free text.
    pub answer: String,
}

impl PendingQuestion {
    /// 1-based option index whose label matches `answer`, if any.
    pub fn option_index(&self, answer: &str) -> Option<usize> {
        self.options.iter().position(|o| o.label == answer).map(|i| i + 1)
    }

    /// Index of the synthetic "custom" choice presented after the last
    /// listed option (every pending question offers free-text as a
    /// fallback in addition to its enumerated options).
    pub fn custom_choice_index(&self) -> usize {
        self.options.len() + 1
    }
}

#[cfg(test)]
#[path = "question_tests.rs"]
mod tests;
