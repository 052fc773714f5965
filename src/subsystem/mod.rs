//! Composition root: wires the three managers and owns their lifecycle.
//!
//! ```text
//! EtlManager --HeuristicInput--> EngineManager --Alert--> AlertManager --> destinations
//! ```

mod manager;
mod request;

pub use manager::*;
pub use request::*;
