use std::collections::HashMap;
use std::sync::Arc;

use crate::client::AlertClient;
use crate::client::PagerDutyClient;
use crate::client::QueueClient;
use crate::client::SlackClient;
use crate::config::RoutingConfig;
use crate::core::Severity;
use crate::Result;

/// Static severity to destination table, built once at boot
#[derive(Clone, Default)]
pub struct RoutingDirectory {
    routes: HashMap<Severity, Vec<Arc<dyn AlertClient>>>,
}

impl RoutingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates every configured destination. All clients share one
    /// HTTP connection pool.
    pub fn from_config(config: &RoutingConfig) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let mut directory = Self::new();

        for severity in Severity::ALL {
            let set = config.destinations(severity);
            for slack in &set.slack {
                directory = directory.with_client(severity, Arc::new(SlackClient::new(slack, http.clone())));
            }
            for pd in &set.pagerduty {
                directory = directory.with_client(severity, Arc::new(PagerDutyClient::new(pd, http.clone())));
            }
            for queue in &set.queue {
                directory = directory.with_client(severity, Arc::new(QueueClient::new(queue, http.clone())));
            }
        }
        Ok(directory)
    }

    pub fn with_client(
        mut self,
        severity: Severity,
        client: Arc<dyn AlertClient>,
    ) -> Self {
        self.routes.entry(severity).or_default().push(client);
        self
    }

    /// Destinations configured for `severity`; empty when none are
    pub fn clients(
        &self,
        severity: Severity,
    ) -> &[Arc<dyn AlertClient>] {
        self.routes.get(&severity).map(Vec::as_slice).unwrap_or(&[])
    }
}
