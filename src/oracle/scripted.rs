//! Oracle that replays canned snippets instead of calling a model.
//!
//! Useful for tests and offline runs. Every prompt it receives is recorded so callers can
//! assert on the number and content of oracle round trips.

use super::CodeOracle;
use crate::error::OracleError;
use crate::types::GeneratedCode;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// A reply the scripted oracle hands out
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Code(String),
    Failure { status: u16, body: String },
}

/// Replays queued or per-method snippets
#[derive(Default)]
pub struct ScriptedOracle {
    queue: Mutex<VecDeque<ScriptedReply>>,
    by_method: Mutex<HashMap<String, ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a snippet for the next unmatched prompt
    pub fn push_code(&self, code: impl Into<String>) -> &Self {
        self.queue.lock().push_back(ScriptedReply::Code(code.into()));
        self
    }

    /// Queue a non-success status for the next unmatched prompt
    pub fn push_failure(&self, status: u16, body: impl Into<String>) -> &Self {
        self.queue.lock().push_back(ScriptedReply::Failure {
            status,
            body: body.into(),
        });
        self
    }

    /// Answer every prompt for `method` with `code`
    pub fn on_method(&self, method: impl Into<String>, code: impl Into<String>) -> &Self {
        self.by_method
            .lock()
            .insert(method.into(), ScriptedReply::Code(code.into()));
        self
    }

    /// Answer every prompt for `method` with a non-success status
    pub fn fail_method(&self, method: impl Into<String>, status: u16) -> &Self {
        self.by_method.lock().insert(
            method.into(),
            ScriptedReply::Failure {
                status,
                body: "scripted failure".to_string(),
            },
        );
        self
    }

    /// Number of prompts received so far
    pub fn request_count(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    fn reply_for(&self, prompt: &str) -> Option<ScriptedReply> {
        let method = method_from_prompt(prompt);
        if let Some(reply) = method.and_then(|m| self.by_method.lock().get(m).cloned()) {
            return Some(reply);
        }
        self.queue.lock().pop_front()
    }
}

fn method_from_prompt(prompt: &str) -> Option<&str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("Method being called: "))
        .map(str::trim)
}

#[async_trait]
impl CodeOracle for ScriptedOracle {
    async fn generate(&self, prompt: &str) -> Result<GeneratedCode, OracleError> {
        self.prompts.lock().push(prompt.to_string());

        match self.reply_for(prompt) {
            Some(ScriptedReply::Code(code)) => GeneratedCode::new(code).ok_or(OracleError::EmptyCode),
            Some(ScriptedReply::Failure { status, body }) => {
                Err(OracleError::Status { status, body })
            }
            None => Err(OracleError::MalformedResponse(
                "scripted oracle has no reply queued".to_string(),
            )),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
