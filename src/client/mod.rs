//! Outbound clients used by the core.
//!
//! - [`ChainClient`] - block/header reads used only by extractor components
//! - [`AlertClient`] - notification destinations used only by the alert manager
//!   ([`SlackClient`], [`PagerDutyClient`], [`QueueClient`])
//!
//! Every call returns its error to the caller. Retrying is owned by the
//! extractor poll loop; destinations are never retried.

mod chain;
mod destination;
mod pagerduty;
mod queue;
mod slack;

pub use chain::*;
pub use destination::*;
pub use pagerduty::*;
pub use queue::*;
pub use slack::*;
