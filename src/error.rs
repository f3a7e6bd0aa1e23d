//! Error types for the gremlin dynamic agent runtime.
//!
//! Every failure inside the invocation pipeline is one of [`SerializationError`],
//! [`OracleError`] or [`ExecutionError`]. Callers of a dynamic method only ever see
//! [`InvocationError`], which names the failing method and keeps the original cause.

use thiserror::Error;

/// A value could not be represented as JSON for transmission to the oracle
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("Argument {index} cannot be serialized: {source}")]
    Argument {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Context value for key '{key}' cannot be serialized: {source}")]
    ContextValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Prompt could not be serialized: {0}")]
    Prompt(String),
}

/// Code-generation oracle failures
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Failed to create oracle client: {0}")]
    Client(String),

    #[error("Oracle transport failed: {0}")]
    Transport(String),

    #[error("Oracle request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed oracle response: {0}")]
    MalformedResponse(String),

    #[error("Oracle returned no code")]
    EmptyCode,
}

/// Generated code failed to evaluate or broke the execution contract
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Generated code does not parse: {0}")]
    Parse(String),

    #[error("Generated code raised an error: {0}")]
    Runtime(String),

    #[error("Generated code exceeded a resource limit: {0}")]
    LimitExceeded(String),

    #[error("Generated code ran longer than {limit_ms} ms")]
    DeadlineExceeded { limit_ms: u64 },

    #[error("Generated code returned a value that is not representable as JSON: {0}")]
    IncompatibleResult(String),

    #[error("Could not bind '{name}' into the sandbox: {reason}")]
    Binding { name: String, reason: String },

    #[error("Context handle is no longer an object map (found {0})")]
    InvalidContext(String),

    #[error("Context key '{0}' uses the reserved prefix")]
    ReservedContextKey(String),
}

/// The underlying reason an invocation failed
#[derive(Debug, Error)]
pub enum InvocationFailure {
    #[error("invalid method name '{0}'")]
    InvalidMethodName(String),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Externally visible failure of a dynamic method call
#[derive(Debug, Error)]
#[error("Failed to execute {method}: {cause}")]
pub struct InvocationError {
    pub method: String,
    #[source]
    pub cause: InvocationFailure,
}

impl InvocationError {
    pub fn new(method: impl Into<String>, cause: impl Into<InvocationFailure>) -> Self {
        Self {
            method: method.into(),
            cause: cause.into(),
        }
    }

    pub fn is_oracle(&self) -> bool {
        matches!(self.cause, InvocationFailure::Oracle(_))
    }

    pub fn is_execution(&self) -> bool {
        matches!(self.cause, InvocationFailure::Execution(_))
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self.cause, InvocationFailure::Serialization(_))
    }
}

/// Configuration and logging setup errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Failures surfaced by the command-line front end
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid call '{text}': {reason}")]
    InvalidCall { text: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),
}
