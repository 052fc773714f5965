use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::config_error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log files output directory
    ///
    /// Default: `default_log_dir()` (./logs)
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            level: default_level(),
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.log_dir.as_os_str().is_empty() {
            return Err(config_error("log_dir path cannot be empty".into()));
        }
        Ok(())
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}
fn default_level() -> String {
    "info".to_string()
}
