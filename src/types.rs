//! Core value types shared across the invocation pipeline.

use crate::context::ContextSnapshot;
use crate::error::{InvocationError, InvocationFailure, SerializationError};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// One dynamic method call: a name and its ordered arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    method: String,
    args: Vec<Value>,
}

impl Invocation {
    /// Create an invocation with no arguments
    pub fn new(method: impl Into<String>) -> Result<Self, InvocationError> {
        Self::with_args(method, Vec::new())
    }

    /// Create an invocation from already-encoded JSON arguments
    pub fn with_args(method: impl Into<String>, args: Vec<Value>) -> Result<Self, InvocationError> {
        let method = method.into();
        if method.trim().is_empty() {
            return Err(InvocationError::new(
                method.clone(),
                InvocationFailure::InvalidMethodName(method),
            ));
        }
        Ok(Self { method, args })
    }

    /// Append an argument, encoding it as JSON
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, InvocationError> {
        let index = self.args.len();
        let encoded = serde_json::to_value(value).map_err(|source| {
            InvocationError::new(
                self.method.clone(),
                SerializationError::Argument { index, source },
            )
        })?;
        self.args.push(encoded);
        Ok(self)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }
}

/// Source text returned by the oracle for one invocation. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode(String);

impl GeneratedCode {
    /// Trim surrounding whitespace; `None` when nothing is left
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeneratedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value returned by generated code plus the context it left behind
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub value: Value,
    pub context: ContextSnapshot,
}

impl ExecutionResult {
    /// Objects and arrays are composite; everything else is primitive
    pub fn is_composite(&self) -> bool {
        matches!(self.value, Value::Object(_) | Value::Array(_))
    }
}
