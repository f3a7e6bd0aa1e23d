//! Execution Engine
//!
//! Generated code runs behind the [`Interpreter`] trait. An interpreter receives the snippet
//! plus an [`ExecutionScope`] holding exactly the agent identity, a mutable copy of the
//! context and the call arguments, and reports the returned value together with the
//! context as the snippet left it. Nothing is committed here; the caller decides.

use crate::context::ContextSnapshot;
use crate::error::ExecutionError;
use crate::types::{ExecutionResult, GeneratedCode};
use serde_json::Value;

mod sandbox;

pub use sandbox::RhaiInterpreter;

/// Everything generated code is allowed to see
#[derive(Debug, Clone)]
pub struct ExecutionScope<'a> {
    pub identity: &'a str,
    pub args: &'a [Value],
    /// Working copy of the context; dropped on failure
    pub context: ContextSnapshot,
}

/// Evaluates generated code inside a restricted scope
pub trait Interpreter: Send + Sync {
    /// Evaluate `code` as one unit against `scope`
    fn execute(
        &self,
        code: &GeneratedCode,
        scope: ExecutionScope<'_>,
    ) -> Result<ExecutionResult, ExecutionError>;

    /// Interpreter name for logging
    fn name(&self) -> &str;
}
