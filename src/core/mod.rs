//! Shared data model flowing between the ETL, engine and alert subsystems.

mod alert;
mod network;
mod path;
mod session;
mod transit;

pub use alert::*;
pub use network::*;
pub use path::*;
pub use session::*;
pub use transit::*;
