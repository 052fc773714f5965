use crate::core::RegisterType;
use crate::core::TransitData;
use crate::core::TransitValue;
use crate::etl::TransformDefinition;
use crate::EngineError;
use crate::Result;

/// Splits a block into one item per transaction, in block order
pub struct TransactionSplitter;

impl TransactionSplitter {
    pub fn construct() -> Result<Box<dyn TransformDefinition>> {
        Ok(Box::new(TransactionSplitter))
    }
}

impl TransformDefinition for TransactionSplitter {
    fn transform(
        &self,
        input: TransitData,
    ) -> Result<Vec<TransitData>> {
        let TransitValue::Block(block) = input.value else {
            return Err(mismatch(RegisterType::Block, input.data_type));
        };

        Ok(block
            .transactions
            .into_iter()
            .map(|tx| TransitData {
                timestamp: input.timestamp,
                network: input.network,
                data_type: RegisterType::Transaction,
                value: TransitValue::Transaction(tx),
            })
            .collect())
    }
}

/// Keeps transactions without a recipient, i.e. contract deployments
pub struct ContractCreationFilter;

impl ContractCreationFilter {
    pub fn construct() -> Result<Box<dyn TransformDefinition>> {
        Ok(Box::new(ContractCreationFilter))
    }
}

impl TransformDefinition for ContractCreationFilter {
    fn transform(
        &self,
        input: TransitData,
    ) -> Result<Vec<TransitData>> {
        let TransitValue::Transaction(tx) = input.value else {
            return Err(mismatch(RegisterType::Transaction, input.data_type));
        };

        if tx.to.is_some() {
            return Ok(vec![]);
        }
        Ok(vec![TransitData {
            timestamp: input.timestamp,
            network: input.network,
            data_type: RegisterType::ContractCreationTx,
            value: TransitValue::Transaction(tx),
        }])
    }
}

/// Keeps transactions sent to the zero address, where value is burnt
pub struct BlackHoleFilter;

impl BlackHoleFilter {
    pub fn construct() -> Result<Box<dyn TransformDefinition>> {
        Ok(Box::new(BlackHoleFilter))
    }
}

impl TransformDefinition for BlackHoleFilter {
    fn transform(
        &self,
        input: TransitData,
    ) -> Result<Vec<TransitData>> {
        let TransitValue::Block(block) = input.value else {
            return Err(mismatch(RegisterType::Block, input.data_type));
        };

        Ok(block
            .transactions
            .into_iter()
            .filter(|tx| tx.to.as_deref().is_some_and(is_zero_address))
            .map(|tx| TransitData {
                timestamp: input.timestamp,
                network: input.network,
                data_type: RegisterType::BlackHoleTx,
                value: TransitValue::Transaction(tx),
            })
            .collect())
    }
}

/// `0x0`, `0x000...0` and friends
fn is_zero_address(address: &str) -> bool {
    let digits = address.strip_prefix("0x").unwrap_or(address);
    !digits.is_empty() && digits.bytes().all(|b| b == b'0')
}

fn mismatch(
    expected: RegisterType,
    got: RegisterType,
) -> crate::Error {
    EngineError::InputTypeMismatch { expected, got }.into()
}
