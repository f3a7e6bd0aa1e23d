//! Configuration sources and their precedence.
//!
//! Lowest to highest: built-in defaults, `OPENAI_API_KEY` as credential fallback, the user
//! config file (`<config dir>/gremlin/config.toml`), an explicit file, then `GREMLIN_*`
//! environment variables (`GREMLIN_AGENT__MODEL=gpt-4o`).

use super::GremlinConfig;
use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const ENV_PREFIX: &str = "GREMLIN";
const CREDENTIAL_FALLBACK_VAR: &str = "OPENAI_API_KEY";

/// Loads [`GremlinConfig`] from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration, optionally layering an explicit file over the user config
    pub fn load(explicit: Option<&Path>) -> Result<GremlinConfig, ConfigError> {
        let mut builder = builder_with_defaults()?;

        match global_config_path() {
            Some(path) if path.exists() => {
                debug!(config_path = %path.display(), "Loading user configuration");
                builder = builder.add_source(File::from(path).required(false));
            }
            Some(path) => {
                debug!(config_path = %path.display(), "No user configuration file");
            }
            None => warn!("Could not determine user configuration directory"),
        }

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        Self::finish(builder.add_source(environment()))
    }

    /// Load configuration from a single file, still honoring environment overrides
    pub fn load_from_file(path: &Path) -> Result<GremlinConfig, ConfigError> {
        let builder = builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .add_source(environment());
        Self::finish(builder)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<GremlinConfig, ConfigError> {
        let config: GremlinConfig = builder.build()?.try_deserialize()?;
        config.agent.validate()?;
        Ok(config)
    }
}

/// Path to the user configuration file
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gremlin").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = Config::builder()
        .set_default("agent.endpoint", super::DEFAULT_ENDPOINT)?
        .set_default("agent.model", super::DEFAULT_MODEL)?
        .set_default("logging.level", "info")?;

    if let Ok(key) = std::env::var(CREDENTIAL_FALLBACK_VAR) {
        if !key.trim().is_empty() {
            builder = builder.set_default("agent.credential", key)?;
        }
    }
    Ok(builder)
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
