//! Chainwatch Error Hierarchy
//!
//! Errors are grouped by the subsystem that raises them. Configuration
//! errors fail fast at the call that introduced them, loop-internal errors
//! are logged by their owning task and never travel over a channel.

use config::ConfigError;

use crate::core::{PathId, RegisterType, SessionId};

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Settings loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Path construction and component runtime failures
    #[error(transparent)]
    Etl(#[from] EtlError),

    /// Heuristic session deployment and evaluation failures
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Alert dispatch failures
    #[error(transparent)]
    Alert(#[from] AlertError),

    /// Outbound RPC and destination client failures
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    /// No constructor registered for a data type
    #[error("no register found for data type {0}")]
    RegisterNotFound(RegisterType),

    #[error("path {0} not found")]
    PathNotFound(PathId),

    /// Start/end heights that cannot describe a range
    #[error("{0}")]
    InvalidHeightRange(&'static str),

    /// Register dependencies loop back onto themselves
    #[error("cyclic dependency detected while resolving {0}")]
    CyclicDependency(RegisterType),

    #[error("route {0} already exists")]
    RouteExists(String),

    #[error("route {0} not found")]
    RouteNotFound(String),

    /// A component tried to emit with no downstream registered
    #[error("component {0} has no routes to send to")]
    NoRoutes(String),

    #[error("component with ID {0} does not exist within dag")]
    ComponentNotFound(String),

    #[error("component with ID {0} already exists in dag")]
    ComponentExists(String),

    #[error("edge already exists from ({0}) to ({1}) in dag")]
    EdgeExists(String, String),

    /// Edge target is a source component
    #[error("component {0} has no input channel")]
    NoInput(String),

    /// Active path count is at the configured maximum
    #[error("max path count of {0} reached")]
    PathLimitReached(usize),

    #[error("path {id} cannot {action} while {state}")]
    InvalidPathState {
        id: PathId,
        action: &'static str,
        state: &'static str,
    },

    #[error("{0} components are not supported")]
    UnsupportedComponent(&'static str),

    /// Addressed register requested without an address
    #[error("register {0} requires an address")]
    MissingAddress(RegisterType),

    /// Backtest extraction gave up on a height
    #[error("backtest retries exhausted at height {height} after {attempts} attempts")]
    BacktestRetriesExhausted { height: u64, attempts: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("heuristic type {0} not found")]
    HeuristicNotFound(String),

    /// Session parameters failed to decode into the heuristic's shape
    #[error("invalid params for heuristic {heuristic}: {reason}")]
    InvalidParams { heuristic: String, reason: String },

    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("invalid input type provided for heuristic. expected {expected}, got {got}")]
    InputTypeMismatch {
        expected: RegisterType,
        got: RegisterType,
    },

    /// A heuristic failed while assessing one data unit
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// Recognized session request method without an implementation
    #[error("session method {0} is not implemented")]
    Unimplemented(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("delivery to {client} failed: {reason}")]
    Delivery { client: String, reason: String },

    #[error("alert channel closed")]
    ChannelClosed,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// JSON-RPC error object returned by the node
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Node returned null for a height it has not produced yet
    #[error("no block at height {0}")]
    BlockNotFound(u64),

    #[error("no rpc client configured for network {0}")]
    UnknownNetwork(String),

    #[error("unexpected status {status} from {client}")]
    Status { client: String, status: u16 },
}

// ============== Conversion Implementations ============== //

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Client(ClientError::Http(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Client(ClientError::Decode(e.to_string()))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Fatal(format!("io error: {e}"))
    }
}
