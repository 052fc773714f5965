use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use super::destination::post_json;
use super::AlertClient;
use crate::alert::interpolator;
use crate::config::PagerDutyConfig;
use crate::core::Alert;
use crate::Result;

pub(crate) const EVENT_SOURCE: &str = "chainwatch";

/// PagerDuty Events v2 trigger
#[derive(Debug, Serialize)]
pub(crate) struct PagerDutyEvent {
    pub routing_key: String,
    pub dedup_key: String,
    pub event_action: &'static str,
    pub payload: PagerDutyPayload,
}

#[derive(Debug, Serialize)]
pub(crate) struct PagerDutyPayload {
    pub summary: String,
    pub source: &'static str,
    pub severity: &'static str,
    pub timestamp: String,
    pub custom_details: Value,
}

/// Paging destination
pub struct PagerDutyClient {
    name: String,
    integration_key: String,
    endpoint: String,
    http: reqwest::Client,
}

impl PagerDutyClient {
    pub fn new(
        config: &PagerDutyConfig,
        http: reqwest::Client,
    ) -> Self {
        Self {
            name: config.name.clone(),
            integration_key: config.integration_key.clone(),
            endpoint: config.endpoint.clone(),
            http,
        }
    }

    pub(crate) fn event(
        &self,
        alert: &Alert,
    ) -> PagerDutyEvent {
        PagerDutyEvent {
            routing_key: self.integration_key.clone(),
            dedup_key: alert.session_id.to_string(),
            event_action: "trigger",
            payload: PagerDutyPayload {
                summary: interpolator::pagerduty_summary(alert),
                source: EVENT_SOURCE,
                severity: alert.severity.pagerduty_severity(),
                timestamp: alert.timestamp.to_rfc3339(),
                custom_details: json!({
                    "network": alert.network,
                    "heuristic": alert.heuristic,
                    "path_id": alert.path_id,
                    "content": alert.content,
                }),
            },
        }
    }
}

#[async_trait]
impl AlertClient for PagerDutyClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(
        &self,
        alert: &Alert,
    ) -> Result<()> {
        post_json(&self.http, &self.endpoint, &self.event(alert), &self.name).await
    }
}
