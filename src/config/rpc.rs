use serde::Deserialize;
use serde::Serialize;

use super::config_error;
use super::validate_url;
use crate::core::Network;
use crate::Result;

/// JSON-RPC endpoints of both networks
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcConfig {
    #[serde(default = "default_l1_rpc_url")]
    pub l1_rpc_url: String,

    #[serde(default = "default_l2_rpc_url")]
    pub l2_rpc_url: String,

    /// Per request timeout (unit: milliseconds)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            l1_rpc_url: default_l1_rpc_url(),
            l2_rpc_url: default_l2_rpc_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl RpcConfig {
    pub fn url(
        &self,
        network: Network,
    ) -> &str {
        match network {
            Network::Layer1 => &self.l1_rpc_url,
            Network::Layer2 => &self.l2_rpc_url,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_url(&self.l1_rpc_url, "l1_rpc")?;
        validate_url(&self.l2_rpc_url, "l2_rpc")?;
        if self.request_timeout_ms == 0 {
            return Err(config_error("request_timeout_ms must be greater than 0".into()));
        }
        Ok(())
    }
}

fn default_l1_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}
fn default_l2_rpc_url() -> String {
    "http://127.0.0.1:9545".to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}
