//! Fixtures and in-memory fakes shared by unit tests
mod fakes;
mod fixtures;

pub use fakes::*;
pub use fixtures::*;
