use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Chain a path extracts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Base chain
    Layer1,
    /// Rollup settling on the base chain
    Layer2,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Layer1 => "layer1",
            Network::Layer2 => "layer2",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "layer1" | "l1" => Ok(Network::Layer1),
            "layer2" | "l2" => Ok(Network::Layer2),
            other => Err(format!("unknown network {other}")),
        }
    }
}

/// Whether a path follows the chain tip or replays a fixed range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathMode {
    Live,
    Backtest,
}

impl PathMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathMode::Live => "live",
            PathMode::Backtest => "backtest",
        }
    }
}

impl fmt::Display for PathMode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data types a component can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterType {
    /// Full block with transactions, one per height
    Block,
    /// Individual transaction split out of a block
    Transaction,
    /// Transaction that deploys a contract
    ContractCreationTx,
    /// Transaction sent to the zero address
    BlackHoleTx,
    /// Native balance of one address, one per height
    AccountBalance,
}

impl RegisterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegisterType::Block => "block",
            RegisterType::Transaction => "transaction",
            RegisterType::ContractCreationTx => "contract_creation_tx",
            RegisterType::BlackHoleTx => "black_hole_tx",
            RegisterType::AccountBalance => "account_balance",
        }
    }
}

impl fmt::Display for RegisterType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
