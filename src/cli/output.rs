//! CLI output: reply rendering and error mapping to a stable CLI surface.

use crate::agent::Reply;
use crate::error::CliError;

/// Render a reply for stdout. Strings print without quotes.
pub fn format_reply(reply: &Reply) -> String {
    match reply.as_value() {
        Some(serde_json::Value::String(text)) => text.clone(),
        _ => reply.to_string(),
    }
}

/// Map errors to a string for CLI output.
pub fn map_error(e: &CliError) -> String {
    match e {
        CliError::Config(inner) => format!("Configuration problem: {}", inner),
        other => other.to_string(),
    }
}
