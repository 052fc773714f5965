//! Heuristic engine: binds sessions to path output and emits alerts.
//!
//! One global loop consumes every path's terminal output in arrival order,
//! so units of the same path are evaluated sequentially. Each unit is
//! assessed against the sessions addressed to its path; a failing session
//! never affects the others.

mod heuristic;
mod manager;
mod session;

pub mod heuristics;

pub use heuristic::*;
pub use manager::*;
pub use session::*;
