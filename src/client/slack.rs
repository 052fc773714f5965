use async_trait::async_trait;
use serde::Serialize;

use super::destination::post_json;
use super::AlertClient;
use crate::alert::interpolator;
use crate::config::SlackConfig;
use crate::core::Alert;
use crate::Result;

#[derive(Debug, Serialize)]
pub(crate) struct SlackPayload {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

/// Chat-ops webhook destination
pub struct SlackClient {
    name: String,
    url: String,
    channel: Option<String>,
    http: reqwest::Client,
}

impl SlackClient {
    pub fn new(
        config: &SlackConfig,
        http: reqwest::Client,
    ) -> Self {
        Self {
            name: config.name.clone(),
            url: config.url.clone(),
            channel: config.channel.clone(),
            http,
        }
    }

    pub(crate) fn payload(
        &self,
        alert: &Alert,
    ) -> SlackPayload {
        SlackPayload {
            text: interpolator::slack_message(alert),
            channel: self.channel.clone(),
        }
    }
}

#[async_trait]
impl AlertClient for SlackClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(
        &self,
        alert: &Alert,
    ) -> Result<()> {
        post_json(&self.http, &self.url, &self.payload(alert), &self.name).await
    }
}
