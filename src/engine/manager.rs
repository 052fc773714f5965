use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::AddressingMap;
use super::Assessment;
use super::HeuristicSession;
use super::HeuristicTable;
use super::SessionStore;
use crate::core::Alert;
use crate::core::AlertPolicy;
use crate::core::HeuristicInput;
use crate::core::HeuristicType;
use crate::core::Network;
use crate::core::PathId;
use crate::core::PathMode;
use crate::core::RegisterType;
use crate::core::SessionId;
use crate::metrics::ACTIVE_SESSIONS;
use crate::metrics::ALERTS_GENERATED;
use crate::metrics::HEURISTIC_FAILURES;
use crate::AlertError;
use crate::EngineError;
use crate::Result;

/// Everything needed to bind a heuristic to a built path
#[derive(Debug, Clone)]
pub struct DeployRequest {
    /// Allocated by the caller so per-session state elsewhere can exist
    /// before the session receives its first unit
    pub id: SessionId,
    pub path_id: PathId,
    pub network: Network,
    pub mode: PathMode,
    pub heuristic: HeuristicType,
    pub params: Value,
    pub policy: AlertPolicy,
}

/// Session removed from the engine, handed back so callers can release its path
#[derive(Debug, Clone)]
pub struct RemovedSession {
    pub id: SessionId,
    pub path_id: PathId,
}

pub struct EngineManager {
    table: HeuristicTable,
    sessions: SessionStore,
    addressing: AddressingMap,
    alert_tx: mpsc::Sender<Alert>,
}

impl EngineManager {
    pub fn new(
        table: HeuristicTable,
        alert_tx: mpsc::Sender<Alert>,
    ) -> Self {
        Self {
            table,
            sessions: SessionStore::new(),
            addressing: AddressingMap::new(),
            alert_tx,
        }
    }

    /// Data type a heuristic must be fed with
    pub fn input_type(
        &self,
        heuristic: HeuristicType,
    ) -> Result<RegisterType> {
        Ok(self.table.get(heuristic)?.input_type)
    }

    /// Constructs the heuristic and subscribes it to `req.path_id`.
    pub fn deploy_session(
        &self,
        req: DeployRequest,
    ) -> Result<SessionId> {
        let register = self.table.get(req.heuristic)?;
        let heuristic = (register.constructor)(&req.params)?;

        let id = req.id;
        self.sessions.insert(HeuristicSession {
            id: id.clone(),
            path_id: req.path_id.clone(),
            network: req.network,
            heuristic_type: req.heuristic,
            policy: req.policy,
            heuristic,
        });
        self.addressing.subscribe(req.path_id.clone(), id.clone());
        ACTIVE_SESSIONS.set(self.sessions.len() as i64);

        info!(session_id = %id, path_id = %req.path_id, heuristic = %req.heuristic, "session deployed");
        Ok(id)
    }

    pub fn remove_session(
        &self,
        id: &SessionId,
    ) -> Result<RemovedSession> {
        let session = self
            .sessions
            .remove(id)
            .ok_or_else(|| EngineError::SessionNotFound(id.clone()))?;
        self.addressing.unsubscribe(&session.path_id, id);
        ACTIVE_SESSIONS.set(self.sessions.len() as i64);

        info!(session_id = %id, path_id = %session.path_id, "session removed");
        Ok(RemovedSession {
            id: id.clone(),
            path_id: session.path_id.clone(),
        })
    }

    pub fn session(
        &self,
        id: &SessionId,
    ) -> Option<Arc<HeuristicSession>> {
        self.sessions.get(id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Sessions subscribed to `path_id`
    pub fn subscribers(
        &self,
        path_id: &PathId,
    ) -> Vec<SessionId> {
        self.addressing.sessions(path_id)
    }

    /// Evaluates one unit against every session addressed to its path.
    ///
    /// A failing or panicking heuristic only loses its own result. Returns
    /// the number of alerts sent downstream.
    pub async fn evaluate(
        &self,
        input: &HeuristicInput,
    ) -> usize {
        let mut sent = 0;
        for session_id in self.addressing.sessions(&input.path_id) {
            let Some(session) = self.sessions.get(&session_id) else {
                continue;
            };

            let assessment = match assess(&session, input) {
                Ok(assessment) => assessment,
                Err(e) => {
                    HEURISTIC_FAILURES.with_label_values(&[session.heuristic_type.as_str()]).inc();
                    error!(
                        session_id = %session.id,
                        height = input.data.height(),
                        "heuristic evaluation failed: {}", e
                    );
                    continue;
                }
            };
            if !assessment.triggered {
                continue;
            }

            let alert = Alert {
                session_id: session.id.clone(),
                path_id: input.path_id.clone(),
                network: session.network,
                heuristic: session.heuristic_type,
                severity: session.policy.severity,
                message: session.policy.message.clone(),
                content: assessment.content,
                timestamp: input.data.timestamp,
            };
            warn!(
                session_id = %alert.session_id,
                heuristic = %alert.heuristic,
                severity = %alert.severity,
                height = input.data.height(),
                "heuristic alert"
            );
            ALERTS_GENERATED
                .with_label_values(&[alert.heuristic.as_str(), alert.severity.as_str()])
                .inc();

            if self.alert_tx.send(alert).await.is_err() {
                error!(session_id = %session.id, "{}", AlertError::ChannelClosed);
                continue;
            }
            sent += 1;
        }
        sent
    }

    /// Consumes path output until cancelled or until every path is gone.
    ///
    /// On cancellation, input already queued is still evaluated so its
    /// alerts reach the alert manager before it stops.
    pub async fn event_loop(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<HeuristicInput>,
        shutdown: CancellationToken,
    ) -> Result<()> {
        info!("engine manager started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    rx.close();
                    let mut drained = 0usize;
                    while let Some(input) = rx.recv().await {
                        self.evaluate(&input).await;
                        drained += 1;
                    }
                    info!(drained, "engine manager shutting down");
                    return Ok(());
                }
                maybe = rx.recv() => match maybe {
                    Some(input) => {
                        debug!(path_id = %input.path_id, height = input.data.height(), "evaluating");
                        self.evaluate(&input).await;
                    }
                    None => {
                        info!("engine input closed");
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn assess(
    session: &HeuristicSession,
    input: &HeuristicInput,
) -> Result<Assessment> {
    match catch_unwind(AssertUnwindSafe(|| session.heuristic.assess(&input.data))) {
        Ok(res) => res,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "heuristic panicked".to_string());
            Err(EngineError::Evaluation(reason).into())
        }
    }
}
