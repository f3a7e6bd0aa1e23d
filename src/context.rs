//! Per-agent persistent state.
//!
//! The store holds one ordered map of string keys to JSON values. It is only ever
//! replaced wholesale by the output of a successful execution; there is no field-level
//! merge. Generated code sees the full prior snapshot, so keys it does not touch survive.

use serde_json::Value;
use std::collections::BTreeMap;

/// Prefix reserved for internal member names and forbidden for context keys.
pub const RESERVED_PREFIX: &str = "_";

/// Snapshot of an agent's context. Ordered so serialization is deterministic.
pub type ContextSnapshot = BTreeMap<String, Value>;

/// Returns true when `name` falls in the reserved internal namespace.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX)
}

/// Mutable context owned by exactly one agent
#[derive(Debug, Default)]
pub struct ContextStore {
    state: ContextSnapshot,
    revision: u64,
}

impl ContextStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state
    pub fn get(&self) -> ContextSnapshot {
        self.state.clone()
    }

    /// Replace the whole state with `snapshot`
    pub fn commit(&mut self, snapshot: ContextSnapshot) {
        self.state = snapshot;
        self.revision += 1;
    }

    /// Number of commits applied since construction
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}
