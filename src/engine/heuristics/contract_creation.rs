use serde::Deserialize;
use serde_json::Value;

use super::listed;
use super::normalize;
use crate::core::HeuristicType;
use crate::core::RegisterType;
use crate::core::TransitData;
use crate::core::TransitValue;
use crate::engine::decode_params;
use crate::engine::expect_input;
use crate::engine::Assessment;
use crate::engine::Heuristic;
use crate::Result;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Params {
    /// Deployers to watch; empty watches every deployer
    #[serde(default)]
    from: Vec<String>,
}

/// Flags contract deployments, optionally only from listed deployers
pub struct ContractCreation {
    from: Vec<String>,
}

impl ContractCreation {
    pub fn new(from: Vec<String>) -> Self {
        Self { from: normalize(from) }
    }

    pub fn construct(params: &Value) -> Result<Box<dyn Heuristic>> {
        let params: Params = decode_params(HeuristicType::ContractCreation, params)?;
        Ok(Box::new(Self::new(params.from)))
    }
}

impl Heuristic for ContractCreation {
    fn heuristic_type(&self) -> HeuristicType {
        HeuristicType::ContractCreation
    }

    fn input_type(&self) -> RegisterType {
        RegisterType::ContractCreationTx
    }

    fn assess(
        &self,
        data: &TransitData,
    ) -> Result<Assessment> {
        expect_input(self.input_type(), data)?;
        let TransitValue::Transaction(tx) = &data.value else {
            return Ok(Assessment::quiet());
        };

        if tx.to.is_some() || (!self.from.is_empty() && !listed(&self.from, &tx.from)) {
            return Ok(Assessment::quiet());
        }
        Ok(Assessment::triggered(format!(
            "contract deployed by {} in tx {} at height {}",
            tx.from, tx.hash, tx.block_number
        )))
    }
}
