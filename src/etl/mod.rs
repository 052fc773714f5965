//! ETL subsystem: resolves data types into running, deduplicated paths.
//!
//! A path is the chain of components producing one data type, upstream
//! first. Components talk only through channels:
//!
//! ```text
//! Extractor --Router--> Transform --Router--> ... --Router[engine]--> EngineManager
//! ```
//!
//! Paths are keyed by [`PathId`](crate::core::PathId) and reference counted
//! by the [`EtlManager`]; the last release tears the chain down with a
//! drain-then-close discipline.

mod component;
mod graph;
mod manager;
mod path;
mod registry;
mod router;
mod store;

pub mod registers;

pub use component::*;
pub use graph::*;
pub use manager::*;
pub use path::*;
pub use registry::*;
pub use router::*;
pub use store::*;

#[cfg(test)]
mod component_test;
#[cfg(test)]
mod graph_test;
