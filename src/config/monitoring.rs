use serde::Deserialize;
use serde::Serialize;

use super::config_error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    /// Serve prometheus metrics on `/metrics`
    #[serde(default)]
    pub metrics_enabled: bool,

    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_port: default_metrics_port(),
        }
    }
}

impl MonitoringConfig {
    pub fn validate(&self) -> Result<()> {
        if self.metrics_enabled && self.metrics_port == 0 {
            return Err(config_error("metrics_port must be non-zero when metrics are enabled".into()));
        }
        Ok(())
    }
}

fn default_metrics_port() -> u16 {
    7300
}
