use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::HeuristicType;
use crate::core::RegisterType;
use crate::core::TransitData;
use crate::EngineError;
use crate::Result;

/// Trigger decision for one data unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub triggered: bool,
    /// Human readable trigger details, empty when not triggered
    pub content: String,
}

impl Assessment {
    pub fn quiet() -> Self {
        Self {
            triggered: false,
            content: String::new(),
        }
    }

    pub fn triggered(content: impl Into<String>) -> Self {
        Self {
            triggered: true,
            content: content.into(),
        }
    }
}

/// Pure evaluation over one data unit and the session's parameters
pub trait Heuristic: Send + Sync {
    fn heuristic_type(&self) -> HeuristicType;

    /// Data type this heuristic consumes
    fn input_type(&self) -> RegisterType;

    fn assess(
        &self,
        data: &TransitData,
    ) -> Result<Assessment>;
}

pub type HeuristicConstructor = fn(&Value) -> Result<Box<dyn Heuristic>>;

/// Constructor and input type of one heuristic
#[derive(Clone, Copy)]
pub struct HeuristicRegister {
    pub heuristic: HeuristicType,
    pub input_type: RegisterType,
    pub constructor: HeuristicConstructor,
}

/// Heuristic type to register lookup, built once at boot
#[derive(Clone, Default)]
pub struct HeuristicTable {
    registers: HashMap<HeuristicType, Arc<HeuristicRegister>>,
}

impl HeuristicTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_register(
        mut self,
        register: HeuristicRegister,
    ) -> Self {
        self.registers.insert(register.heuristic, Arc::new(register));
        self
    }

    pub fn get(
        &self,
        heuristic: HeuristicType,
    ) -> Result<Arc<HeuristicRegister>> {
        self.registers
            .get(&heuristic)
            .cloned()
            .ok_or_else(|| EngineError::HeuristicNotFound(heuristic.to_string()).into())
    }
}

/// Decodes session parameters; `null` reads as an empty object.
pub(crate) fn decode_params<T: DeserializeOwned>(
    heuristic: HeuristicType,
    params: &Value,
) -> Result<T> {
    let value = match params {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(value).map_err(|e| {
        EngineError::InvalidParams {
            heuristic: heuristic.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Rejects data of the wrong type before a heuristic looks at it
pub(crate) fn expect_input(
    expected: RegisterType,
    data: &TransitData,
) -> Result<()> {
    if data.data_type != expected {
        return Err(EngineError::InputTypeMismatch {
            expected,
            got: data.data_type,
        }
        .into());
    }
    Ok(())
}
