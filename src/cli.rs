//! CLI domain: parse, route and output only.
//! The agent pipeline lives in the library; this layer turns arguments into calls.

mod output;
mod parse;
mod route;

pub use output::{format_reply, map_error};
pub use parse::{parse_call, CallSpec, Cli};
pub use route::{apply_overrides, RunContext};
