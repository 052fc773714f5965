use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::CooldownTable;
use super::RoutingDirectory;
use crate::core::Alert;
use crate::core::AlertPolicy;
use crate::core::SessionId;
use crate::metrics::ALERTS_DELIVERED;
use crate::metrics::ALERTS_SUPPRESSED;
use crate::metrics::ALERT_DELIVERY_FAILURES;
use crate::Result;

/// Result of one [`AlertManager::dispatch`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Dropped because the session is cooling down
    Suppressed,
    /// Fanned out; counts per destination
    Delivered { succeeded: usize, failed: usize },
}

pub struct AlertManager {
    routing: RoutingDirectory,
    cooldowns: Mutex<CooldownTable>,
}

impl AlertManager {
    pub fn new(routing: RoutingDirectory) -> Self {
        Self {
            routing,
            cooldowns: Mutex::new(CooldownTable::new()),
        }
    }

    /// Registers cooldown tracking for a session before it is deployed.
    pub fn add_session(
        &self,
        id: SessionId,
        policy: &AlertPolicy,
    ) {
        debug!(session_id = %id, cooldown_secs = policy.cooldown_seconds, "tracking alert cooldown");
        self.cooldowns.lock().register(id, policy.cooldown());
    }

    /// Sessions with a cooldown entry
    pub fn tracked_sessions(&self) -> usize {
        self.cooldowns.lock().len()
    }

    pub fn remove_session(
        &self,
        id: &SessionId,
    ) -> bool {
        self.cooldowns.lock().remove(id)
    }

    /// Applies cooldown suppression, then sends `alert` to every destination
    /// routed for its severity.
    ///
    /// A suppressed alert is a silent drop, not an error. Destination
    /// failures are logged and counted; they are not retried.
    pub async fn dispatch(
        &self,
        alert: &Alert,
    ) -> DispatchOutcome {
        let admitted = self.cooldowns.lock().try_acquire(&alert.session_id, Instant::now());
        if !admitted {
            debug!(session_id = %alert.session_id, "alert suppressed by cooldown");
            ALERTS_SUPPRESSED.with_label_values(&[alert.heuristic.as_str()]).inc();
            return DispatchOutcome::Suppressed;
        }

        let clients = self.routing.clients(alert.severity);
        if clients.is_empty() {
            warn!(severity = %alert.severity, session_id = %alert.session_id, "no destinations routed for severity");
            return DispatchOutcome::Delivered {
                succeeded: 0,
                failed: 0,
            };
        }

        info!(
            session_id = %alert.session_id,
            severity = %alert.severity,
            destinations = clients.len(),
            "dispatching alert"
        );

        let results = join_all(clients.iter().map(|client| async move {
            let res = client.send(alert).await;
            (client.name(), res)
        }))
        .await;

        let mut succeeded = 0;
        let mut failed = 0;
        for (name, res) in results {
            match res {
                Ok(()) => {
                    succeeded += 1;
                    ALERTS_DELIVERED.with_label_values(&[name]).inc();
                }
                Err(e) => {
                    failed += 1;
                    ALERT_DELIVERY_FAILURES.with_label_values(&[name]).inc();
                    error!(destination = name, session_id = %alert.session_id, "alert delivery failed: {:?}", e);
                }
            }
        }
        DispatchOutcome::Delivered { succeeded, failed }
    }

    /// Consumes alerts until cancelled or until every sender is gone.
    ///
    /// On cancellation, alerts already queued are still dispatched.
    pub async fn event_loop(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<Alert>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        info!("alert manager started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    rx.close();
                    let mut drained = 0usize;
                    while let Some(alert) = rx.recv().await {
                        self.dispatch(&alert).await;
                        drained += 1;
                    }
                    info!(drained, "alert manager shutting down");
                    return Ok(());
                }
                maybe = rx.recv() => match maybe {
                    Some(alert) => {
                        self.dispatch(&alert).await;
                    }
                    None => {
                        info!("alert channel closed");
                        return Ok(());
                    }
                }
            }
        }
    }
}
