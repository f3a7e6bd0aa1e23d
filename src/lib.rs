//! Gremlin: Agents With Synthesized Methods
//!
//! An agent whose methods are not predefined. Any unrecognized call is turned into a prompt
//! for a code-generation model, the returned Rhai snippet runs in a restricted sandbox, and
//! whatever state it writes is kept on the agent for the next call.

pub mod agent;
pub mod cli;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod logging;
pub mod oracle;
pub mod prompt;
pub mod replication;
pub mod types;

pub use agent::{make_agent, Agent, Reply};
pub use config::{AgentConfig, ExecutionLimits, GremlinConfig};
pub use error::{
    ConfigError, ExecutionError, InvocationError, InvocationFailure, OracleError,
    SerializationError,
};
pub use types::Invocation;
