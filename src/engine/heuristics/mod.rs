//! Built-in heuristics.

mod balance_enforcement;
mod contract_creation;
mod large_transfer;

pub use balance_enforcement::*;
pub use contract_creation::*;
pub use large_transfer::*;

use serde::Deserialize;

use super::HeuristicRegister;
use super::HeuristicTable;
use crate::core::HeuristicType;
use crate::core::RegisterType;
use crate::EngineError;
use crate::Result;

/// Table holding every built-in heuristic
pub fn default_table() -> HeuristicTable {
    HeuristicTable::new()
        .with_register(HeuristicRegister {
            heuristic: HeuristicType::ContractCreation,
            input_type: RegisterType::ContractCreationTx,
            constructor: ContractCreation::construct,
        })
        .with_register(HeuristicRegister {
            heuristic: HeuristicType::LargeTransfer,
            input_type: RegisterType::Transaction,
            constructor: LargeTransfer::construct,
        })
        .with_register(HeuristicRegister {
            heuristic: HeuristicType::BalanceEnforcement,
            input_type: RegisterType::AccountBalance,
            constructor: BalanceEnforcement::construct,
        })
}

/// Wei amount given either as a JSON number or a decimal string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Amount {
    Number(u64),
    Text(String),
}

impl Amount {
    fn wei(
        self,
        heuristic: HeuristicType,
        field: &str,
    ) -> Result<u128> {
        match self {
            Amount::Number(n) => Ok(u128::from(n)),
            Amount::Text(s) => s.trim().parse::<u128>().map_err(|e| {
                EngineError::InvalidParams {
                    heuristic: heuristic.to_string(),
                    reason: format!("{field} {s:?}: {e}"),
                }
                .into()
            }),
        }
    }
}

/// Lowercased address list, so matching ignores checksum casing
fn normalize(addresses: Vec<String>) -> Vec<String> {
    addresses.into_iter().map(|a| a.to_ascii_lowercase()).collect()
}

fn listed(
    list: &[String],
    address: &str,
) -> bool {
    list.iter().any(|a| a.eq_ignore_ascii_case(address))
}
