use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::core::Alert;
use crate::ClientError;
use crate::Result;

/// Notification destination (chat-ops, paging, queue)
#[async_trait]
pub trait AlertClient: Send + Sync {
    /// Configured destination name, used in logs
    fn name(&self) -> &str;

    /// Delivers one alert. Errors are reported, never retried by the caller.
    async fn send(
        &self,
        alert: &Alert,
    ) -> Result<()>;
}

/// Posts `body` as JSON and maps non-2xx answers to [`ClientError::Status`]
pub(crate) async fn post_json<T: Serialize + ?Sized>(
    http: &reqwest::Client,
    url: &str,
    body: &T,
    client: &str,
) -> Result<()> {
    let response = http.post(url).json(body).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status {
            client: client.to_string(),
            status: status.as_u16(),
        }
        .into());
    }
    debug!(client, status = status.as_u16(), "alert posted");
    Ok(())
}
