use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use super::config_error;
use super::etl::default_input_buffer;
use super::validate_url;
use crate::core::Severity;
use crate::Result;

/// Alert manager settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AlertConfig {
    /// Buffer of the channel carrying alerts out of the engine
    #[serde(default = "default_input_buffer")]
    pub input_buffer: usize,

    /// Severity to destination table
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            input_buffer: default_input_buffer(),
            routing: RoutingConfig::default(),
        }
    }
}

impl AlertConfig {
    pub fn validate(&self) -> Result<()> {
        if self.input_buffer == 0 {
            return Err(config_error("alert input_buffer must be greater than 0".into()));
        }
        self.routing.validate()
    }
}

/// Destinations per severity level
///
/// Higher levels usually list a superset of the lower ones, but nothing
/// enforces it: each level is looked up on its own.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RoutingConfig {
    #[serde(default)]
    pub low: DestinationSet,
    #[serde(default)]
    pub medium: DestinationSet,
    #[serde(default)]
    pub high: DestinationSet,
}

impl RoutingConfig {
    pub fn destinations(
        &self,
        severity: Severity,
    ) -> &DestinationSet {
        match severity {
            Severity::Low => &self.low,
            Severity::Medium => &self.medium,
            Severity::High => &self.high,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for severity in Severity::ALL {
            self.destinations(severity).validate(severity)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DestinationSet {
    #[serde(default)]
    pub slack: Vec<SlackConfig>,
    #[serde(default)]
    pub pagerduty: Vec<PagerDutyConfig>,
    #[serde(default)]
    pub queue: Vec<QueueConfig>,
}

impl DestinationSet {
    pub fn is_empty(&self) -> bool {
        self.slack.is_empty() && self.pagerduty.is_empty() && self.queue.is_empty()
    }

    fn validate(
        &self,
        severity: Severity,
    ) -> Result<()> {
        let mut names = HashSet::new();
        let entries = self
            .slack
            .iter()
            .map(|c| (&c.name, &c.url))
            .chain(self.pagerduty.iter().map(|c| (&c.name, &c.endpoint)))
            .chain(self.queue.iter().map(|c| (&c.name, &c.url)));

        for (name, url) in entries {
            if name.is_empty() {
                return Err(config_error(format!(
                    "{severity} destination name cannot be empty"
                )));
            }
            if !names.insert(name.as_str()) {
                return Err(config_error(format!(
                    "duplicate destination {name} under {severity}"
                )));
            }
            validate_url(url, name)?;
        }

        for pd in &self.pagerduty {
            if pd.integration_key.is_empty() {
                return Err(config_error(format!(
                    "pagerduty destination {} has no integration_key",
                    pd.name
                )));
            }
        }
        Ok(())
    }
}

/// Chat-ops webhook
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SlackConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub channel: Option<String>,
}

/// Paging integration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PagerDutyConfig {
    pub name: String,
    pub integration_key: String,
    #[serde(default = "default_pagerduty_endpoint")]
    pub endpoint: String,
}

/// Queue endpoint receiving JSON alert envelopes
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueueConfig {
    pub name: String,
    pub url: String,
}

fn default_pagerduty_endpoint() -> String {
    "https://events.pagerduty.com/v2/enqueue".to_string()
}
