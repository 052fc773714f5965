use serde::Deserialize;
use serde_json::Value;

use super::Amount;
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
    /// Account the path extracts balances for
    address: String,
    #[serde(default)]
    upper: Option<Amount>,
    #[serde(default)]
    lower: Option<Amount>,
}

/// Flags an account whose balance leaves the `[lower, upper]` band
pub struct BalanceEnforcement {
    upper: Option<u128>,
    lower: Option<u128>,
}

impl BalanceEnforcement {
    pub fn new(
        upper: Option<u128>,
        lower: Option<u128>,
    ) -> Self {
        Self { upper, lower }
    }

    pub fn construct(params: &Value) -> Result<Box<dyn Heuristic>> {
        let kind = HeuristicType::BalanceEnforcement;
        let params: Params = decode_params(kind, params)?;
        let invalid = |reason: &str| EngineError::InvalidParams {
            heuristic: kind.to_string(),
            reason: reason.into(),
        };

        if params.address.trim().is_empty() {
            return Err(invalid("address must not be empty").into());
        }
        let upper = params.upper.map(|a| a.wei(kind, "upper")).transpose()?;
        let lower = params.lower.map(|a| a.wei(kind, "lower")).transpose()?;
        match (lower, upper) {
            (None, None) => return Err(invalid("at least one of upper or lower is required").into()),
            (Some(lower), Some(upper)) if lower > upper => {
                return Err(invalid("lower must not exceed upper").into());
            }
            _ => {}
        }
        Ok(Box::new(Self::new(upper, lower)))
    }
}

impl Heuristic for BalanceEnforcement {
    fn heuristic_type(&self) -> HeuristicType {
        HeuristicType::BalanceEnforcement
    }

    fn input_type(&self) -> RegisterType {
        RegisterType::AccountBalance
    }

    fn assess(
        &self,
        data: &TransitData,
    ) -> Result<Assessment> {
        expect_input(self.input_type(), data)?;
        let TransitValue::AccountBalance(account) = &data.value else {
            return Ok(Assessment::quiet());
        };

        let breach = match (self.upper, self.lower) {
            (Some(upper), _) if account.balance > upper => format!("above upper bound {upper}"),
            (_, Some(lower)) if account.balance < lower => format!("below lower bound {lower}"),
            _ => return Ok(Assessment::quiet()),
        };
        Ok(Assessment::triggered(format!(
            "balance of {} is {} wei at height {}, {breach}",
            account.address, account.balance, account.height
        )))
    }
}
