//! Streaming risk heuristics over base chain and rollup data.
//!
//! Three managers form the pipeline, composed by [`subsystem::Subsystem`]:
//! - [`etl::EtlManager`] builds deduplicated extraction paths
//! - [`engine::EngineManager`] evaluates heuristic sessions on path output
//! - [`alert::AlertManager`] applies cooldowns and fans alerts out by severity

pub mod alert;
pub mod client;
pub mod config;
pub mod core;
pub mod engine;
mod errors;
pub mod etl;
pub mod metrics;
pub mod subsystem;
pub mod utils;

pub use errors::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
