use std::fmt;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::HeuristicType;
use super::Network;
use super::PathId;
use super::SessionId;

/// Flat alert severity; routing is a table lookup per level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// PagerDuty Events v2 severity
    pub fn pagerduty_severity(&self) -> &'static str {
        match self {
            Severity::Low => "warning",
            Severity::Medium => "error",
            Severity::High => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller supplied notification policy of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPolicy {
    pub message: String,
    pub severity: Severity,
    /// Minimum seconds between two delivered alerts
    #[serde(default)]
    pub cooldown_seconds: u64,
}

impl AlertPolicy {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}

/// Triggered notification event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub session_id: SessionId,
    pub path_id: PathId,
    pub network: Network,
    pub heuristic: HeuristicType,
    pub severity: Severity,
    pub message: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}
