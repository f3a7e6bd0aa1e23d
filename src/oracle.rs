//! Code-Generation Oracle
//!
//! The oracle turns a prompt into source text. [`HttpOracle`] speaks the OpenAI-compatible
//! chat-completions contract: one POST per prompt, one user message, bounded `max_tokens`
//! and a low `temperature`. There are no retries, no backoff and no response caching.

use crate::config::AgentConfig;
use crate::error::OracleError;
use crate::types::GeneratedCode;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub mod scripted;

pub use scripted::ScriptedOracle;

/// Source of generated code for dynamic invocations
#[async_trait]
pub trait CodeOracle: Send + Sync {
    /// Exchange one prompt for one snippet of generated code
    async fn generate(&self, prompt: &str) -> Result<GeneratedCode, OracleError>;

    /// Model identifier, for diagnostics
    fn model_name(&self) -> &str;
}

// OpenAI-compatible request/response structures
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn map_http_error(error: reqwest::Error) -> OracleError {
    if error.is_timeout() {
        OracleError::Transport(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        OracleError::Transport(format!("Connection error: {}", error))
    } else {
        OracleError::Transport(format!("HTTP error: {}", error))
    }
}

/// Oracle backed by a chat-completions HTTP endpoint
pub struct HttpOracle {
    client: Client,
    endpoint: String,
    model: String,
    credential: Option<String>,
    max_tokens: u32,
    temperature: f32,
}

impl HttpOracle {
    pub fn new(config: &AgentConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OracleError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            credential: config.credential.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CodeOracle for HttpOracle {
    async fn generate(&self, prompt: &str) -> Result<GeneratedCode, OracleError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "Sending oracle request");

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json");
        if let Some(credential) = &self.credential {
            builder = builder.header("Authorization", format!("Bearer {}", credential));
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OracleError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                OracleError::MalformedResponse("missing choices[0].message.content".to_string())
            })?;

        GeneratedCode::new(content).ok_or(OracleError::EmptyCode)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
