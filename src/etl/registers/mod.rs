//! Built-in data registers.
//!
//! ```text
//! block (extractor) --> transaction (transform) --> contract_creation_tx (transform)
//!                   \--> black_hole_tx (transform)
//! account_balance (extractor, addressed)
//! ```

mod balance;
mod block;
mod transaction;

pub use balance::*;
pub use block::*;
pub use transaction::*;


use super::DataRegister;
use super::RegisterRegistry;
use crate::core::RegisterType;

/// Registry holding every built-in register
pub fn default_registry() -> RegisterRegistry {
    RegisterRegistry::new()
        .with_register(DataRegister::extractor(RegisterType::Block, BlockExtractor::construct))
        .with_register(DataRegister::transform(
            RegisterType::Transaction,
            TransactionSplitter::construct,
            vec![RegisterType::Block],
        ))
        .with_register(DataRegister::transform(
            RegisterType::ContractCreationTx,
            ContractCreationFilter::construct,
            vec![RegisterType::Transaction],
        ))
        .with_register(DataRegister::transform(
            RegisterType::BlackHoleTx,
            BlackHoleFilter::construct,
            vec![RegisterType::Block],
        ))
        .with_register(
            DataRegister::extractor(RegisterType::AccountBalance, AccountBalanceExtractor::construct).with_addressing(),
        )
}
