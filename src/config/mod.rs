//! Configuration management for the chainwatch process.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file named by `CONFIG_PATH`
//! - Environment variable overrides (`CHAINWATCH__SECTION__KEY`)
//! - Component-wise validation
//!
//! Settings are read once at boot and shared immutably afterwards.
mod alert;
mod etl;
mod logging;
mod monitoring;
mod rpc;
pub use alert::*;
pub use etl::*;
pub use logging::*;
pub use monitoring::*;
pub use rpc::*;

use std::env;
use std::path::PathBuf;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

pub(crate) const ENV_PREFIX: &str = "CHAINWATCH";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Path construction, polling and router settings
    #[serde(default)]
    pub etl: EtlConfig,
    /// Chain RPC endpoints
    #[serde(default)]
    pub rpc: RpcConfig,
    /// Heuristic engine settings
    #[serde(default)]
    pub engine: EngineConfig,
    /// Cooldown input and severity routing table
    #[serde(default)]
    pub alert: AlertConfig,
    /// Metrics endpoint
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Optional JSON file holding session requests deployed at startup
    #[serde(default)]
    pub bootstrap_path: Option<PathBuf>,
}

impl Settings {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// Sources are merged in the following order (later sources override earlier):
    /// 1. Type defaults
    /// 2. Configuration file from `CONFIG_PATH` (if set)
    /// 3. Environment variables with `CHAINWATCH__` prefix
    ///
    /// Callers MUST call `validate()` before using the configuration.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Applies an additional configuration file on top of the current values.
    ///
    /// Environment variables keep the highest priority.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.etl.validate()?;
        self.rpc.validate()?;
        self.engine.validate()?;
        self.alert.validate()?;
        self.monitoring.validate()?;
        self.logging.validate()?;
        if let Some(path) = &self.bootstrap_path {
            if path.as_os_str().is_empty() {
                return Err(config_error("bootstrap_path cannot be empty".into()));
            }
        }
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

pub(super) fn config_error(msg: String) -> Error {
    Error::Config(ConfigError::Message(msg))
}

/// Ensures a destination or RPC URL is an http(s) endpoint
pub(super) fn validate_url(
    url: &str,
    name: &str,
) -> Result<()> {
    if url.is_empty() {
        return Err(config_error(format!("{name} url cannot be empty")));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(config_error(format!(
            "{name} url must start with http:// or https://, got {url}"
        )));
    }
    Ok(())
}
