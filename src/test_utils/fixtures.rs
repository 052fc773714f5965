use chrono::Utc;
use lazy_static::lazy_static;

use crate::core::Alert;
use crate::core::Block;
use crate::core::BlockHeader;
use crate::core::ClientConfig;
use crate::core::HeuristicType;
use crate::core::Network;
use crate::core::PathConfig;
use crate::core::PathId;
use crate::core::PathMode;
use crate::core::RegisterType;
use crate::core::SessionId;
use crate::core::Severity;
use crate::core::Transaction;
use crate::core::TransitData;
use crate::core::TransitValue;

lazy_static! {
    static ref LOGGER_INIT: () = {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    };
}

pub fn enable_logger() {
    *LOGGER_INIT;
}

/// Live tip path over layer 1 blocks
pub fn live_config(data_type: RegisterType) -> PathConfig {
    PathConfig {
        network: Network::Layer1,
        data_type,
        mode: PathMode::Live,
        client: ClientConfig {
            poll_interval_ms: 100,
            start_height: None,
            end_height: None,
            address: None,
        },
    }
}

pub fn backtest_config(
    data_type: RegisterType,
    start: u64,
    end: u64,
) -> PathConfig {
    PathConfig {
        network: Network::Layer1,
        data_type,
        mode: PathMode::Backtest,
        client: ClientConfig {
            poll_interval_ms: 100,
            start_height: Some(start),
            end_height: Some(end),
            address: None,
        },
    }
}

pub fn path_id() -> PathId {
    live_config(RegisterType::Block).identity()
}

pub fn alert_for(
    heuristic: HeuristicType,
    severity: Severity,
) -> Alert {
    Alert {
        session_id: SessionId::new(Network::Layer1, PathMode::Live, heuristic),
        path_id: path_id(),
        network: Network::Layer1,
        heuristic,
        severity,
        message: "suspicious activity".into(),
        content: "tx 0xaa".into(),
        timestamp: Utc::now(),
    }
}

pub fn transfer(
    block_number: u64,
    to: Option<&str>,
    value: u128,
) -> Transaction {
    Transaction {
        hash: format!("0x{block_number:x}{value:x}"),
        block_number,
        from: "0xsender".into(),
        to: to.map(str::to_string),
        value,
    }
}

pub fn block_data(height: u64) -> TransitData {
    block_with(height, vec![])
}

pub fn block_with(
    height: u64,
    transactions: Vec<Transaction>,
) -> TransitData {
    TransitData::new(
        Network::Layer1,
        RegisterType::Block,
        TransitValue::Block(Block {
            header: BlockHeader {
                number: height,
                hash: format!("0xblock{height}"),
                parent_hash: format!("0xblock{}", height.saturating_sub(1)),
                timestamp: 1_700_000_000 + height * 12,
            },
            transactions,
        }),
    )
}

pub fn transaction_data(tx: Transaction) -> TransitData {
    TransitData::new(Network::Layer1, RegisterType::Transaction, TransitValue::Transaction(tx))
}
