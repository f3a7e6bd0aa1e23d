//! CLI parse: clap types for gremlin plus the call syntax.

use crate::error::CliError;
use clap::Parser;
use serde_json::Value;
use std::path::PathBuf;

/// Gremlin CLI - call methods that do not exist yet
#[derive(Parser, Debug)]
#[command(name = "gremlin")]
#[command(about = "Agents whose methods are synthesized on demand")]
pub struct Cli {
    /// Agent identity
    pub identity: String,

    /// Calls to make, in order: method(json, json, ...)
    #[arg(required = true, num_args = 1.., value_parser = parse_call)]
    pub calls: Vec<CallSpec>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Show generated code and enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Wet mode: composite results become child agents
    #[arg(long, default_value = "false")]
    pub wet: bool,

    /// Model identifier sent to the oracle
    #[arg(long)]
    pub model: Option<String>,

    /// Chat-completions endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// One method call parsed from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct CallSpec {
    pub method: String,
    pub args: Vec<Value>,
}

/// Parse `method(json, json, ...)`. A bare `method` takes no arguments.
pub fn parse_call(text: &str) -> Result<CallSpec, CliError> {
    let invalid = |reason: String| CliError::InvalidCall {
        text: text.to_string(),
        reason,
    };

    let trimmed = text.trim();
    let (method, args) = match trimmed.find('(') {
        None => (trimmed, Vec::new()),
        Some(open) => {
            let inner = trimmed[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| invalid("missing closing parenthesis".to_string()))?;
            let args: Vec<Value> = serde_json::from_str(&format!("[{}]", inner))
                .map_err(|e| invalid(format!("arguments are not JSON: {}", e)))?;
            (trimmed[..open].trim(), args)
        }
    };

    if method.is_empty() {
        return Err(invalid("missing method name".to_string()));
    }
    if method.chars().any(|c| c.is_whitespace()) {
        return Err(invalid("method name contains whitespace".to_string()));
    }

    Ok(CallSpec {
        method: method.to_string(),
        args,
    })
}
