use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::config_error;
use crate::core::Network;
use crate::Result;

/// Path construction and extraction settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EtlConfig {
    /// Poll interval of base chain extractors
    ///
    /// Default: `default_l1_poll_interval_ms()` (5000ms)
    #[serde(default = "default_l1_poll_interval_ms")]
    pub l1_poll_interval_ms: u64,

    /// Poll interval of rollup extractors
    ///
    /// Default: `default_l2_poll_interval_ms()` (2000ms)
    #[serde(default = "default_l2_poll_interval_ms")]
    pub l2_poll_interval_ms: u64,

    /// Maximum number of concurrently active paths
    #[serde(default = "default_max_path_count")]
    pub max_path_count: usize,

    /// Consecutive failed polls a backtest path tolerates before it crashes
    #[serde(default = "default_backtest_max_retries")]
    pub backtest_max_retries: usize,

    #[serde(default)]
    pub router: RouterConfig,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            l1_poll_interval_ms: default_l1_poll_interval_ms(),
            l2_poll_interval_ms: default_l2_poll_interval_ms(),
            max_path_count: default_max_path_count(),
            backtest_max_retries: default_backtest_max_retries(),
            router: RouterConfig::default(),
        }
    }
}

impl EtlConfig {
    pub fn poll_interval(
        &self,
        network: Network,
    ) -> Duration {
        match network {
            Network::Layer1 => Duration::from_millis(self.l1_poll_interval_ms),
            Network::Layer2 => Duration::from_millis(self.l2_poll_interval_ms),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.l1_poll_interval_ms == 0 || self.l2_poll_interval_ms == 0 {
            return Err(config_error("poll intervals must be greater than 0".into()));
        }
        if self.max_path_count == 0 {
            return Err(config_error("max_path_count must be greater than 0".into()));
        }
        self.router.validate()
    }
}

/// What a router does when a downstream channel is full
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SendPolicy {
    /// Wait for capacity; a slow consumer backpressures the whole path
    #[default]
    Block,
    /// Discard the item for that destination and keep going
    DropNewest,
}

/// Fan-out router channel settings
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct RouterConfig {
    /// Buffer size of every component input channel
    #[serde(default = "default_router_capacity")]
    pub capacity: usize,

    #[serde(default)]
    pub policy: SendPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            capacity: default_router_capacity(),
            policy: SendPolicy::Block,
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<()> {
        // tokio bounded channels panic on zero capacity
        if self.capacity == 0 {
            return Err(config_error("router capacity must be greater than 0".into()));
        }
        Ok(())
    }
}

/// Heuristic engine settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineConfig {
    /// Buffer of the channel carrying path output into the engine
    #[serde(default = "default_input_buffer")]
    pub input_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            input_buffer: default_input_buffer(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.input_buffer == 0 {
            return Err(config_error("engine input_buffer must be greater than 0".into()));
        }
        Ok(())
    }
}

fn default_l1_poll_interval_ms() -> u64 {
    5000
}
fn default_l2_poll_interval_ms() -> u64 {
    2000
}
fn default_max_path_count() -> usize {
    10
}
fn default_backtest_max_retries() -> usize {
    5
}
fn default_router_capacity() -> usize {
    64
}
pub(super) fn default_input_buffer() -> usize {
    256
}
