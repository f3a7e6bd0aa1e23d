//! CLI route: run context that owns the agent and feeds it the parsed calls.

use crate::agent::{Agent, Reply};
use crate::cli::parse::{CallSpec, Cli};
use crate::config::{AgentConfig, ConfigLoader};
use crate::error::CliError;
use tracing::{debug, info};

/// Runtime context for CLI execution: the root agent built from config and flags.
pub struct RunContext {
    agent: Agent,
}

impl RunContext {
    /// Load configuration, apply CLI overrides and build the root agent
    pub fn new(cli: &Cli) -> Result<Self, CliError> {
        let config = match cli.config {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(None)?,
        };
        let agent_config = apply_overrides(config.agent, cli);
        let agent = Agent::new(cli.identity.clone(), agent_config)?;
        info!(agent = %agent.identity(), model = %agent.config().model, "Agent ready");
        Ok(Self { agent })
    }

    /// Wrap an already-built agent
    pub fn from_agent(agent: Agent) -> Self {
        Self { agent }
    }

    /// Run `calls` in order, handing each reply to `emit` as it arrives.
    ///
    /// A reply carrying a child agent makes that child the receiver of the remaining calls.
    /// Stops at the first failing call.
    pub async fn execute<F>(&self, calls: &[CallSpec], mut emit: F) -> Result<Reply, CliError>
    where
        F: FnMut(&CallSpec, &Reply),
    {
        let mut receiver = self.agent.clone();
        let mut last = Reply::Undefined;

        for call in calls {
            let reply = receiver.call(&call.method, call.args.clone()).await?;
            emit(call, &reply);

            if let Reply::Agent(ref child) = reply {
                debug!(parent = %receiver.identity(), child = %child.identity(), "Switching receiver");
                receiver = child.clone();
            }
            last = reply;
        }

        Ok(last)
    }
}

/// Layer command-line flags over the loaded agent configuration
pub fn apply_overrides(mut config: AgentConfig, cli: &Cli) -> AgentConfig {
    if cli.verbose {
        config.verbose = true;
    }
    if cli.wet {
        config.replication = true;
    }
    if let Some(ref model) = cli.model {
        config.model = model.clone();
    }
    if let Some(ref endpoint) = cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    config
}
