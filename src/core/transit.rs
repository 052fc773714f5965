use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::Network;
use super::PathId;
use super::RegisterType;

/// Header fields of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: String,
    pub parent_hash: String,
    /// Unix seconds
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: String,
    pub block_number: u64,
    pub from: String,
    /// `None` for contract deployments
    pub to: Option<String>,
    /// Transferred value in wei
    pub value: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

/// Native balance of an address as of one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub address: String,
    pub height: u64,
    /// Balance in wei
    pub balance: u128,
}

/// Payload carried by a [`TransitData`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitValue {
    Block(Block),
    Transaction(Transaction),
    AccountBalance(AccountBalance),
}

/// One unit of extracted or transformed data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitData {
    pub timestamp: DateTime<Utc>,
    pub network: Network,
    pub data_type: RegisterType,
    pub value: TransitValue,
}

impl TransitData {
    pub fn new(
        network: Network,
        data_type: RegisterType,
        value: TransitValue,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            network,
            data_type,
            value,
        }
    }

    /// Height the payload belongs to
    pub fn height(&self) -> u64 {
        match &self.value {
            TransitValue::Block(b) => b.header.number,
            TransitValue::Transaction(tx) => tx.block_number,
            TransitValue::AccountBalance(b) => b.height,
        }
    }
}

/// Terminal path output addressed to the engine
#[derive(Debug, Clone)]
pub struct HeuristicInput {
    pub path_id: PathId,
    pub data: TransitData,
}
