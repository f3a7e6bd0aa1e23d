//! Wet-mode replication.
//!
//! When enabled, a dynamic call whose generated code returns an object or array does not
//! hand that value back. Instead a fresh agent named `<parent>.<method>` is produced with the
//! parent's configuration and an empty context, so calls can be chained.

use crate::agent::{make_agent, Agent, Reply};
use serde_json::Value;
use tracing::debug;

/// Decides whether a result is returned raw or wrapped as a child agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicationPolicy {
    enabled: bool,
}

impl ReplicationPolicy {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Identity given to a child spawned by `method` on `parent`
    pub fn child_identity(parent: &str, method: &str) -> String {
        format!("{}.{}", parent, method)
    }

    /// Turn a successful result into the reply handed to the caller
    pub fn apply(&self, parent: &Agent, method: &str, value: Value) -> Reply {
        let composite = matches!(value, Value::Object(_) | Value::Array(_));
        if !self.enabled || !composite {
            return Reply::Value(value);
        }

        let identity = Self::child_identity(parent.identity(), method);
        debug!(parent = %parent.identity(), child = %identity, "Replicating composite result");

        Reply::Agent(make_agent(
            identity,
            parent.config().clone(),
            parent.oracle(),
            parent.interpreter(),
        ))
    }
}
