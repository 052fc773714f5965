use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::AlertPolicy;
use crate::core::ClientConfig;
use crate::core::Network;
use crate::core::PathConfig;
use crate::core::PathMode;
use crate::core::RegisterType;
use crate::Error;
use crate::Result;

/// Operation requested on a heuristic session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMethod {
    #[default]
    Run,
    /// Recognized, not implemented
    Update,
    /// Recognized, not implemented
    Stop,
}

impl SessionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMethod::Run => "run",
            SessionMethod::Update => "update",
            SessionMethod::Stop => "stop",
        }
    }
}

/// Session deploy request as submitted by an operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub network: Network,
    pub heuristic_type: String,
    #[serde(default)]
    pub start_height: Option<u64>,
    #[serde(default)]
    pub end_height: Option<u64>,
    pub alert_policy: AlertPolicy,
    #[serde(default)]
    pub heuristic_params: Value,
}

impl SessionRequest {
    /// Backtest when an end height bounds the range, live otherwise
    pub fn mode(&self) -> PathMode {
        match self.end_height {
            Some(_) => PathMode::Backtest,
            None => PathMode::Live,
        }
    }

    /// `address` heuristic parameter, lowercased
    pub fn address(&self) -> Option<String> {
        self.heuristic_params
            .get("address")
            .and_then(Value::as_str)
            .map(str::to_ascii_lowercase)
    }

    /// Path feeding this session's heuristic with `data_type`
    pub fn path_config(
        &self,
        data_type: RegisterType,
        poll_interval_ms: u64,
        address: Option<String>,
    ) -> PathConfig {
        PathConfig {
            network: self.network,
            data_type,
            mode: self.mode(),
            client: ClientConfig {
                poll_interval_ms,
                start_height: self.start_height,
                end_height: self.end_height,
                address,
            },
        }
    }
}

/// Envelope pairing a method with its request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequestBody {
    #[serde(default)]
    pub method: SessionMethod,
    pub params: SessionRequest,
}

const BOOTSTRAP_EXTENSION: &str = "json";

/// Reads the session requests deployed at startup.
pub async fn load_bootstrap(path: &Path) -> Result<Vec<SessionRequest>> {
    if path.extension().and_then(|e| e.to_str()) != Some(BOOTSTRAP_EXTENSION) {
        return Err(Error::Fatal(format!(
            "invalid bootstrap file format {}; expected .{BOOTSTRAP_EXTENSION}",
            path.display()
        )));
    }

    let raw = tokio::fs::read(path).await?;
    let sessions: Vec<SessionRequest> = serde_json::from_slice(&raw)?;
    Ok(sessions)
}
