//! Gremlin CLI Binary
//!
//! Builds one agent from configuration and flags, then makes each requested call in order.

use clap::Parser;
use gremlin::cli::{format_reply, map_error, Cli, RunContext};
use gremlin::config::ConfigLoader;
use gremlin::error::CliError;
use gremlin::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);

    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Gremlin CLI starting");

    let context = match RunContext::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => fail(e),
    };

    let result = context
        .execute(&cli.calls, |_, reply| println!("{}", format_reply(reply)))
        .await;

    match result {
        Ok(_) => info!(calls = cli.calls.len(), "All calls completed"),
        Err(e) => fail(e),
    }
}

fn fail(e: CliError) -> ! {
    error!("Command failed: {}", e);
    eprintln!("{}", map_error(&e));
    process::exit(1);
}

/// Build logging configuration from CLI args, environment, and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default(),
        None => ConfigLoader::load(None)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default(),
    };

    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }

    config
}
