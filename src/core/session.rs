use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::Network;
use super::PathMode;

/// Heuristics known to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicType {
    /// Flags contract deployments
    ContractCreation,
    /// Flags transfers at or above a value threshold
    LargeTransfer,
    /// Flags an address balance leaving its configured bounds
    BalanceEnforcement,
}

impl HeuristicType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeuristicType::ContractCreation => "contract_creation",
            HeuristicType::LargeTransfer => "large_transfer",
            HeuristicType::BalanceEnforcement => "balance_enforcement",
        }
    }
}

impl fmt::Display for HeuristicType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeuristicType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contract_creation" => Ok(HeuristicType::ContractCreation),
            "large_transfer" => Ok(HeuristicType::LargeTransfer),
            "balance_enforcement" => Ok(HeuristicType::BalanceEnforcement),
            other => Err(other.to_string()),
        }
    }
}

/// Heuristic session identity (SUUID)
///
/// Rendered as `network:mode:heuristic::uuid`; the random suffix keeps ids
/// unique for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(
        network: Network,
        mode: PathMode,
        heuristic: HeuristicType,
    ) -> Self {
        SessionId(format!("{network}:{mode}:{heuristic}::{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}
