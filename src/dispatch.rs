//! Member-name interception.
//!
//! Every member access on an agent is classified here before anything else happens:
//! declared members are answered directly, reserved names are inert, and everything else
//! becomes a dynamic invocation.

use crate::context::is_reserved;
use std::collections::BTreeSet;

/// Members every agent really has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredMember {
    Identity,
    Context,
    Config,
}

const DECLARED: &[(&str, DeclaredMember)] = &[
    ("identity", DeclaredMember::Identity),
    ("context", DeclaredMember::Context),
    ("config", DeclaredMember::Config),
    ("_identity", DeclaredMember::Identity),
    ("_context", DeclaredMember::Context),
    ("_config", DeclaredMember::Config),
];

/// How a member name is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Declared(DeclaredMember),
    Reserved,
    Dynamic,
}

/// Per-agent lookup table for member names
#[derive(Debug, Clone, Default)]
pub struct InterceptionLayer {
    exceptions: BTreeSet<String>,
}

impl InterceptionLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserved-prefixed names listed here are routed to the oracle anyway
    pub fn with_exceptions<I, S>(exceptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exceptions: exceptions.into_iter().map(Into::into).collect(),
        }
    }

    pub fn resolve(&self, name: &str) -> Resolution {
        if let Some((_, member)) = DECLARED.iter().find(|(declared, _)| *declared == name) {
            return Resolution::Declared(*member);
        }
        if is_reserved(name) && !self.exceptions.contains(name) {
            return Resolution::Reserved;
        }
        Resolution::Dynamic
    }
}
