use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use super::ComponentKind;
use super::ExtractorDefinition;
use super::TransformDefinition;
use crate::client::ChainClient;
use crate::core::Network;
use crate::core::RegisterType;
use crate::EtlError;
use crate::Result;

/// Inputs handed to an extractor constructor
#[derive(Clone)]
pub struct ExtractorContext {
    pub network: Network,
    pub client: Arc<dyn ChainClient>,
    /// Path address, set only for addressed registers
    pub address: Option<String>,
}

pub type ExtractorConstructor = fn(ExtractorContext) -> Result<Box<dyn ExtractorDefinition>>;
pub type TransformConstructor = fn() -> Result<Box<dyn TransformDefinition>>;

/// Typed constructor per component kind
#[derive(Debug, Clone, Copy)]
pub enum Constructor {
    Extractor(ExtractorConstructor),
    Transform(TransformConstructor),
    Conveyor,
}

impl Constructor {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Constructor::Extractor(_) => ComponentKind::Extractor,
            Constructor::Transform(_) => ComponentKind::Transform,
            Constructor::Conveyor => ComponentKind::Conveyor,
        }
    }
}

/// Production recipe of one data type
#[derive(Debug, Clone)]
pub struct DataRegister {
    pub data_type: RegisterType,
    pub constructor: Constructor,
    /// Upstream data types, consumed in order
    pub dependencies: Vec<RegisterType>,
    /// Paths of this type are keyed by an address as well
    pub addressing: bool,
}

impl DataRegister {
    pub fn extractor(
        data_type: RegisterType,
        constructor: ExtractorConstructor,
    ) -> Self {
        Self {
            data_type,
            constructor: Constructor::Extractor(constructor),
            dependencies: vec![],
            addressing: false,
        }
    }

    pub fn transform(
        data_type: RegisterType,
        constructor: TransformConstructor,
        dependencies: Vec<RegisterType>,
    ) -> Self {
        Self {
            data_type,
            constructor: Constructor::Transform(constructor),
            dependencies,
            addressing: false,
        }
    }

    /// Marks the register as reading one address per path
    pub fn with_addressing(mut self) -> Self {
        self.addressing = true;
        self
    }

    pub fn kind(&self) -> ComponentKind {
        self.constructor.kind()
    }
}

/// Data type to register lookup, built once at boot and read-only afterwards
#[derive(Clone, Default)]
pub struct RegisterRegistry {
    registers: HashMap<RegisterType, Arc<DataRegister>>,
}

impl RegisterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_register(
        mut self,
        register: DataRegister,
    ) -> Self {
        self.registers.insert(register.data_type, Arc::new(register));
        self
    }

    pub fn get(
        &self,
        data_type: RegisterType,
    ) -> Result<Arc<DataRegister>> {
        self.registers
            .get(&data_type)
            .cloned()
            .ok_or_else(|| EtlError::RegisterNotFound(data_type).into())
    }

    /// Registers needed to produce `data_type`, upstream first.
    ///
    /// Shared ancestors appear once. A dependency loop is a
    /// [`EtlError::CyclicDependency`].
    pub fn dependency_order(
        &self,
        data_type: RegisterType,
    ) -> Result<Vec<Arc<DataRegister>>> {
        let mut order = Vec::new();
        let mut done = HashSet::new();
        let mut visiting = HashSet::new();
        self.visit(data_type, &mut visiting, &mut done, &mut order)?;
        Ok(order)
    }

    fn visit(
        &self,
        data_type: RegisterType,
        visiting: &mut HashSet<RegisterType>,
        done: &mut HashSet<RegisterType>,
        order: &mut Vec<Arc<DataRegister>>,
    ) -> Result<()> {
        if done.contains(&data_type) {
            return Ok(());
        }
        if !visiting.insert(data_type) {
            return Err(EtlError::CyclicDependency(data_type).into());
        }

        let register = self.get(data_type)?;
        for dep in &register.dependencies {
            self.visit(*dep, visiting, done, order)?;
        }

        visiting.remove(&data_type);
        done.insert(data_type);
        order.push(register);
        Ok(())
    }
}
