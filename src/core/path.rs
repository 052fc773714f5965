use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use super::Network;
use super::PathMode;
use super::RegisterType;
use crate::errors::EtlError;
use crate::Result;

pub(crate) const START_AFTER_END_ERR: &str = "start height cannot be more than the end height";
pub(crate) const LATEST_WITH_END_ERR: &str =
    "cannot start with latest block height with end height configured";
pub(crate) const BACKTEST_WITHOUT_RANGE_ERR: &str = "backtest paths require an end height";

/// Extractor-facing settings of a path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Delay between two polls of the RPC client
    pub poll_interval_ms: u64,

    /// First height to extract; `None` starts at the chain tip
    pub start_height: Option<u64>,

    /// Last height to extract (inclusive); `None` runs forever
    pub end_height: Option<u64>,

    /// Account read by addressed extractors, lowercased
    #[serde(default)]
    pub address: Option<String>,
}

impl ClientConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Request to materialize a stream of one data type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathConfig {
    pub network: Network,
    pub data_type: RegisterType,
    pub mode: PathMode,
    pub client: ClientConfig,
}

impl PathConfig {
    /// Rejects height ranges that cannot be extracted.
    pub fn validate(&self) -> Result<()> {
        match (self.client.start_height, self.client.end_height) {
            (None, Some(_)) => {
                return Err(EtlError::InvalidHeightRange(LATEST_WITH_END_ERR).into());
            }
            (Some(start), Some(end)) if start > end => {
                return Err(EtlError::InvalidHeightRange(START_AFTER_END_ERR).into());
            }
            _ => {}
        }

        if self.mode == PathMode::Backtest && self.client.end_height.is_none() {
            return Err(EtlError::InvalidHeightRange(BACKTEST_WITHOUT_RANGE_ERR).into());
        }

        Ok(())
    }

    /// Deterministic identity of the component chain this config describes.
    ///
    /// Two configs with equal network, data type, mode and client settings
    /// (address included) always map to the same id.
    pub fn identity(&self) -> PathId {
        let mut hasher = Sha256::new();
        hasher.update(self.network.as_str());
        hasher.update([0u8]);
        hasher.update(self.data_type.as_str());
        hasher.update([0u8]);
        hasher.update(self.mode.as_str());
        hasher.update([0u8]);
        hasher.update(self.client.poll_interval_ms.to_be_bytes());
        hash_height(&mut hasher, self.client.start_height);
        hash_height(&mut hasher, self.client.end_height);
        if let Some(address) = &self.client.address {
            hasher.update([1u8]);
            hasher.update(address.as_bytes());
        }

        let digest = hex::encode(hasher.finalize());
        PathId(format!(
            "{}:{}:{}:{}",
            self.network,
            self.mode,
            self.data_type,
            &digest[..16]
        ))
    }
}

fn hash_height(
    hasher: &mut Sha256,
    height: Option<u64>,
) {
    match height {
        Some(h) => {
            hasher.update([1u8]);
            hasher.update(h.to_be_bytes());
        }
        None => hasher.update([0u8]),
    }
}

/// Path identity (PUUID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathId(String);

impl PathId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}
