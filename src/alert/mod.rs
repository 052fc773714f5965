//! Alert manager: cooldown suppression and severity routed fan-out.
//!
//! ```text
//! engine --Alert--> [cooldown check] --suppressed--> drop (debug log)
//!                          |
//!                          v
//!               routing[alert.severity] --> client 1 (send, log failure)
//!                                       --> client 2
//!                                       --> ...
//! ```
//!
//! Each destination is tried once per delivered alert. A failing destination
//! never blocks or retries the others.

pub mod interpolator;
mod cooldown;
mod manager;
mod routing;

pub use cooldown::*;
pub use manager::*;
pub use routing::*;
