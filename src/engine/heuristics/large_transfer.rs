use serde::Deserialize;
use serde_json::Value;

use super::listed;
use super::Amount;
use super::normalize;
use crate::core::HeuristicType;
use crate::core::RegisterType;
use crate::core::TransitData;
use crate::core::TransitValue;
use crate::engine::decode_params;
use crate::engine::expect_input;
use crate::engine::Assessment;
use crate::engine::Heuristic;
use crate::EngineError;
use crate::Result;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Params {
    threshold: Amount,
    /// Addresses to watch as sender or recipient; empty watches all
    #[serde(default)]
    addresses: Vec<String>,
}

/// Flags transfers moving at least `threshold` wei
pub struct LargeTransfer {
    threshold: u128,
    addresses: Vec<String>,
}

impl LargeTransfer {
    pub fn new(
        threshold: u128,
        addresses: Vec<String>,
    ) -> Self {
        Self {
            threshold,
            addresses: normalize(addresses),
        }
    }

    pub fn construct(params: &Value) -> Result<Box<dyn Heuristic>> {
        let params: Params = decode_params(HeuristicType::LargeTransfer, params)?;
        let threshold = params.threshold.wei(HeuristicType::LargeTransfer, "threshold")?;
        if threshold == 0 {
            return Err(EngineError::InvalidParams {
                heuristic: HeuristicType::LargeTransfer.to_string(),
                reason: "threshold must be greater than 0".into(),
            }
            .into());
        }
        Ok(Box::new(Self::new(threshold, params.addresses)))
    }

    fn watches(
        &self,
        from: &str,
        to: Option<&str>,
    ) -> bool {
        self.addresses.is_empty() || listed(&self.addresses, from) || to.is_some_and(|to| listed(&self.addresses, to))
    }
}

impl Heuristic for LargeTransfer {
    fn heuristic_type(&self) -> HeuristicType {
        HeuristicType::LargeTransfer
    }

    fn input_type(&self) -> RegisterType {
        RegisterType::Transaction
    }

    fn assess(
        &self,
        data: &TransitData,
    ) -> Result<Assessment> {
        expect_input(self.input_type(), data)?;
        let TransitValue::Transaction(tx) = &data.value else {
            return Ok(Assessment::quiet());
        };

        if tx.value < self.threshold || !self.watches(&tx.from, tx.to.as_deref()) {
            return Ok(Assessment::quiet());
        }
        Ok(Assessment::triggered(format!(
            "transfer of {} wei from {} to {} in tx {} at height {}",
            tx.value,
            tx.from,
            tx.to.as_deref().unwrap_or("<contract creation>"),
            tx.hash,
            tx.block_number
        )))
    }
}
