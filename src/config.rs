//! Configuration System
//!
//! Agent and logging configuration. Values are layered by [`ConfigLoader`] from built-in
//! defaults, the user config file, an explicit file and `GREMLIN_*` environment variables.

use crate::context::{is_reserved, RESERVED_PREFIX};
use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

mod sources;

pub use sources::ConfigLoader;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GremlinConfig {
    /// Settings applied to every agent built from this configuration
    #[serde(default)]
    pub agent: AgentConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Per-agent configuration, copied verbatim into replicated children
#[derive(Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Chat-completions URL of the oracle
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Oracle model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer credential; requests carry no Authorization header when unset
    #[serde(default)]
    pub credential: Option<String>,

    /// Emit generated code at info level
    #[serde(default)]
    pub verbose: bool,

    /// Wrap composite results as child agents ("wet" mode)
    #[serde(default)]
    pub replication: bool,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Reserved-prefixed names that are still routed to the oracle
    #[serde(default)]
    pub reserved_exceptions: Vec<String>,

    /// Sandbox limits for generated code
    #[serde(default)]
    pub limits: ExecutionLimits,
}

/// Resource limits enforced by the script sandbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLimits {
    #[serde(default = "default_max_operations")]
    pub max_operations: u64,

    #[serde(default = "default_max_call_levels")]
    pub max_call_levels: usize,

    #[serde(default = "default_max_expr_depth")]
    pub max_expr_depth: usize,

    #[serde(default = "default_max_string_size")]
    pub max_string_size: usize,

    #[serde(default = "default_max_array_size")]
    pub max_array_size: usize,

    #[serde(default = "default_max_map_size")]
    pub max_map_size: usize,

    /// Wall-clock budget for one evaluation
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u64,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.1
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_operations() -> u64 {
    1_000_000
}

fn default_max_call_levels() -> usize {
    32
}

fn default_max_expr_depth() -> usize {
    64
}

fn default_max_string_size() -> usize {
    1024 * 1024 // 1 MiB
}

fn default_max_array_size() -> usize {
    10_000
}

fn default_max_map_size() -> usize {
    10_000
}

fn default_max_duration_ms() -> u64 {
    5_000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            credential: None,
            verbose: false,
            replication: false,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            reserved_exceptions: Vec::new(),
            limits: ExecutionLimits::default(),
        }
    }
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_operations: default_max_operations(),
            max_call_levels: default_max_call_levels(),
            max_expr_depth: default_max_expr_depth(),
            max_string_size: default_max_string_size(),
            max_array_size: default_max_array_size(),
            max_map_size: default_max_map_size(),
            max_duration_ms: default_max_duration_ms(),
        }
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("verbose", &self.verbose)
            .field("replication", &self.replication)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("reserved_exceptions", &self.reserved_exceptions)
            .field("limits", &self.limits)
            .finish()
    }
}

impl AgentConfig {
    /// Builder-style toggle for verbose traces
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builder-style toggle for wet mode
    pub fn replication(mut self, replication: bool) -> Self {
        self.replication = replication;
        self
    }

    pub fn credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Validate agent configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("Model cannot be empty".to_string()));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "Invalid endpoint URL: {} (must start with http:// or https://)",
                self.endpoint
            )));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "Temperature {} out of range (0.0-2.0)",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        if let Some(name) = self.reserved_exceptions.iter().find(|n| !is_reserved(n)) {
            return Err(ConfigError::Invalid(format!(
                "Reserved exception '{}' does not start with '{}'",
                name, RESERVED_PREFIX
            )));
        }
        self.limits.validate()
    }

    /// JSON view of the configuration with the credential redacted
    pub fn redacted(&self) -> serde_json::Value {
        let mut view = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let Some(map) = view.as_object_mut() {
            if self.credential.is_some() {
                map.insert(
                    "credential".to_string(),
                    serde_json::Value::String("<redacted>".to_string()),
                );
            }
        }
        view
    }
}

impl ExecutionLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_operations == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_operations must be greater than zero".to_string(),
            ));
        }
        if self.max_duration_ms == 0 {
            return Err(ConfigError::Invalid(
                "limits.max_duration_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
