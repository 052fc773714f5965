use async_trait::async_trait;

use super::destination::post_json;
use super::AlertClient;
use crate::alert::interpolator;
use crate::config::QueueConfig;
use crate::core::Alert;
use crate::Result;

/// Queue destination receiving the JSON alert envelope
pub struct QueueClient {
    name: String,
    url: String,
    http: reqwest::Client,
}

impl QueueClient {
    pub fn new(
        config: &QueueConfig,
        http: reqwest::Client,
    ) -> Self {
        Self {
            name: config.name.clone(),
            url: config.url.clone(),
            http,
        }
    }
}

#[async_trait]
impl AlertClient for QueueClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(
        &self,
        alert: &Alert,
    ) -> Result<()> {
        let envelope = interpolator::queue_envelope(alert);
        post_json(&self.http, &self.url, &envelope, &self.name).await
    }
}
