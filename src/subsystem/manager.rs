use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::SessionMethod;
use super::SessionRequest;
use super::SessionRequestBody;
use crate::alert::AlertManager;
use crate::alert::RoutingDirectory;
use crate::client::ChainClients;
use crate::config::Settings;
use crate::core::Alert;
use crate::core::HeuristicInput;
use crate::core::HeuristicType;
use crate::core::SessionId;
use crate::engine::heuristics::default_table;
use crate::engine::DeployRequest;
use crate::engine::EngineManager;
use crate::engine::HeuristicTable;
use crate::etl::registers::default_registry;
use crate::etl::EtlManager;
use crate::etl::RegisterRegistry;
use crate::utils::spawn_task;
use crate::EngineError;
use crate::Error;
use crate::Result;

/// Injected lookup tables and clients the managers are built from
pub struct Dependencies {
    pub registry: RegisterRegistry,
    pub heuristics: HeuristicTable,
    pub clients: ChainClients,
    pub routing: RoutingDirectory,
}

impl Dependencies {
    /// Built-in registers and heuristics, clients from `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            registry: default_registry(),
            heuristics: default_table(),
            clients: ChainClients::from_config(&settings.rpc)?,
            routing: RoutingDirectory::from_config(&settings.alert.routing)?,
        })
    }
}

struct Channels {
    engine_rx: mpsc::Receiver<HeuristicInput>,
    alert_rx: mpsc::Receiver<Alert>,
}

#[derive(Default)]
struct Handles {
    etl: Option<JoinHandle<Result<()>>>,
    engine: Option<JoinHandle<Result<()>>>,
    alert: Option<JoinHandle<Result<()>>>,
}

/// Composition root wiring ETL -> engine -> alert
pub struct Subsystem {
    etl: Arc<EtlManager>,
    engine: Arc<EngineManager>,
    alert: Arc<AlertManager>,
    root: CancellationToken,
    engine_token: CancellationToken,
    alert_token: CancellationToken,
    channels: Mutex<Option<Channels>>,
    handles: Mutex<Handles>,
}

impl Subsystem {
    pub fn new(
        settings: &Settings,
        deps: Dependencies,
    ) -> Self {
        let root = CancellationToken::new();
        let (engine_tx, engine_rx) = mpsc::channel(settings.engine.input_buffer);
        let (alert_tx, alert_rx) = mpsc::channel(settings.alert.input_buffer);

        let etl = EtlManager::new(
            deps.registry,
            deps.clients,
            settings.etl.clone(),
            engine_tx,
            root.child_token(),
        );
        Self {
            etl: Arc::new(etl),
            engine: Arc::new(EngineManager::new(deps.heuristics, alert_tx)),
            alert: Arc::new(AlertManager::new(deps.routing)),
            engine_token: root.child_token(),
            alert_token: root.child_token(),
            root,
            channels: Mutex::new(Some(Channels { engine_rx, alert_rx })),
            handles: Mutex::new(Handles::default()),
        }
    }

    pub fn etl(&self) -> &Arc<EtlManager> {
        &self.etl
    }

    pub fn engine(&self) -> &Arc<EngineManager> {
        &self.engine
    }

    pub fn alert(&self) -> &Arc<AlertManager> {
        &self.alert
    }

    /// Spawns one supervised task per manager event loop.
    pub fn start(&self) -> Result<()> {
        let Channels { engine_rx, alert_rx } = self
            .channels
            .lock()
            .take()
            .ok_or_else(|| Error::Fatal("subsystem already started".into()))?;

        let mut handles = self.handles.lock();
        handles.etl = Some(spawn_task("etl manager", self.etl.clone().event_loop()));
        handles.engine = Some(spawn_task(
            "engine manager",
            self.engine.clone().event_loop(engine_rx, self.engine_token.clone()),
        ));
        handles.alert = Some(spawn_task(
            "alert manager",
            self.alert.clone().event_loop(alert_rx, self.alert_token.clone()),
        ));
        info!("subsystem started");
        Ok(())
    }

    /// Dispatches a request on its method; only `run` is implemented.
    pub async fn handle(
        &self,
        body: SessionRequestBody,
    ) -> Result<SessionId> {
        match body.method {
            SessionMethod::Run => self.run_session(body.params).await,
            method @ (SessionMethod::Update | SessionMethod::Stop) => {
                Err(EngineError::Unimplemented(method.as_str()).into())
            }
        }
    }

    /// Builds (or reuses) the path the heuristic needs and deploys a session on it.
    pub async fn run_session(
        &self,
        req: SessionRequest,
    ) -> Result<SessionId> {
        let heuristic = HeuristicType::from_str(&req.heuristic_type).map_err(EngineError::HeuristicNotFound)?;
        let data_type = self.engine.input_type(heuristic)?;
        let poll_interval = self.etl.config().poll_interval(req.network);
        let address = if self.etl.requires_address(data_type)? {
            req.address()
        } else {
            None
        };
        let cfg = req.path_config(data_type, poll_interval.as_millis() as u64, address);

        let (path_id, reused) = self.etl.build_path(&cfg)?;

        // Cooldown first: the session may receive data as soon as it is deployed
        let session_id = SessionId::new(req.network, cfg.mode, heuristic);
        self.alert.add_session(session_id.clone(), &req.alert_policy);

        let deployed = self.engine.deploy_session(DeployRequest {
            id: session_id.clone(),
            path_id: path_id.clone(),
            network: req.network,
            mode: cfg.mode,
            heuristic,
            params: req.heuristic_params,
            policy: req.alert_policy.clone(),
        });

        if let Err(e) = deployed {
            self.alert.remove_session(&session_id);
            if let Err(release) = self.etl.release_path(&path_id).await {
                warn!(%path_id, "failed to release path of rejected session: {}", release);
            }
            return Err(e);
        }

        info!(%session_id, %path_id, reused, "heuristic session running");
        Ok(session_id)
    }

    /// Unsubscribes the session, drops its cooldown entry and releases its path.
    pub async fn remove_session(
        &self,
        id: &SessionId,
    ) -> Result<()> {
        let removed = self.engine.remove_session(id)?;
        self.alert.remove_session(id);
        let torn_down = self.etl.release_path(&removed.path_id).await?;
        info!(session_id = %id, path_id = %removed.path_id, torn_down, "heuristic session removed");
        Ok(())
    }

    /// Stops the managers in ETL -> engine -> alert order so queued items
    /// drain toward sinks that are still open.
    pub async fn shutdown(&self) {
        info!("subsystem shutting down");
        let handles = std::mem::take(&mut *self.handles.lock());

        self.etl.shutdown().await;
        join("etl manager", handles.etl).await;

        self.engine_token.cancel();
        join("engine manager", handles.engine).await;

        self.alert_token.cancel();
        join("alert manager", handles.alert).await;

        self.root.cancel();
        info!("subsystem stopped");
    }
}

async fn join(
    name: &str,
    handle: Option<JoinHandle<Result<()>>>,
) {
    let Some(handle) = handle else {
        return;
    };
    match handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(task = name, "event loop failed: {:?}", e),
        Err(e) => error!(task = name, "event loop panicked: {:?}", e),
    }
}
