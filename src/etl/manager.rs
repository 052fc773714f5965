use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::ComponentGraph;
use super::ComponentId;
use super::ComponentKind;
use super::Constructor;
use super::Extractor;
use super::ExtractorContext;
use super::ExtractorSettings;
use super::Outlet;
use super::Path;
use super::PathEvent;
use super::PathState;
use super::PathStore;
use super::RegisterRegistry;
use super::SharedComponent;
use super::Transform;
use super::ENGINE_ROUTE;
use crate::client::ChainClients;
use crate::config::EtlConfig;
use crate::core::HeuristicInput;
use crate::core::PathConfig;
use crate::core::PathId;
use crate::core::RegisterType;
use crate::metrics::ACTIVE_PATHS;
use crate::EtlError;
use crate::Error;
use crate::Result;

/// Builds, deduplicates and supervises paths.
///
/// Every built path's terminal component relays into the engine ingress
/// channel handed over at construction.
pub struct EtlManager {
    registry: RegisterRegistry,
    clients: ChainClients,
    config: EtlConfig,
    engine_tx: mpsc::Sender<HeuristicInput>,
    store: PathStore,
    events_tx: mpsc::UnboundedSender<PathEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<PathEvent>>>,
    shutdown: CancellationToken,
}

impl EtlManager {
    pub fn new(
        registry: RegisterRegistry,
        clients: ChainClients,
        config: EtlConfig,
        engine_tx: mpsc::Sender<HeuristicInput>,
        shutdown: CancellationToken,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            registry,
            clients,
            config,
            engine_tx,
            store: PathStore::new(),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            shutdown,
        }
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// Whether paths producing `data_type` must carry an address
    pub fn requires_address(
        &self,
        data_type: RegisterType,
    ) -> Result<bool> {
        Ok(self
            .registry
            .dependency_order(data_type)?
            .iter()
            .any(|register| register.addressing))
    }

    /// Materializes `cfg` as a running path.
    ///
    /// An identical config reuses the running chain: its reference count is
    /// incremented and `true` is returned alongside the identity. Only new
    /// paths are subject to the max path count.
    pub fn build_path(
        &self,
        cfg: &PathConfig,
    ) -> Result<(PathId, bool)> {
        cfg.validate()?;
        let id = cfg.identity();

        let (path, exists) = self
            .store
            .acquire_or_insert(&id, self.config.max_path_count, || self.construct(&id, cfg))?;

        if exists {
            debug!(path_id = %id, refs = ?self.store.ref_count(&id), "reusing existing path");
            return Ok((id, true));
        }

        if let Err(e) = path.run(&self.shutdown) {
            // A fresh path is always inactive; undo the insert if it is not.
            let _ = self.store.release(&id);
            return Err(e);
        }
        ACTIVE_PATHS.set(self.store.len() as i64);
        info!(path_id = %id, data_type = %cfg.data_type, mode = %cfg.mode, "path built");
        Ok((id, false))
    }

    fn construct(
        &self,
        id: &PathId,
        cfg: &PathConfig,
    ) -> Result<Path> {
        let registers = self.registry.dependency_order(cfg.data_type)?;
        let mut graph = ComponentGraph::new();
        let mut produced: HashMap<RegisterType, ComponentId> = HashMap::new();

        for register in registers {
            let component: SharedComponent = match register.constructor {
                Constructor::Extractor(constructor) => {
                    let address = match (register.addressing, &cfg.client.address) {
                        (true, None) => return Err(EtlError::MissingAddress(register.data_type).into()),
                        (true, Some(address)) => Some(address.clone()),
                        (false, _) => None,
                    };
                    let context = ExtractorContext {
                        network: cfg.network,
                        client: self.clients.get(cfg.network)?,
                        address,
                    };
                    let settings = ExtractorSettings {
                        network: cfg.network,
                        mode: cfg.mode,
                        poll_interval: cfg.client.poll_interval(),
                        start_height: cfg.client.start_height,
                        end_height: cfg.client.end_height,
                        max_retries: self.config.backtest_max_retries,
                    };
                    Arc::new(Extractor::new(
                        register.data_type,
                        settings,
                        constructor(context)?,
                        &self.config.router,
                    ))
                }
                Constructor::Transform(constructor) => Arc::new(Transform::new(
                    register.data_type,
                    constructor()?,
                    &self.config.router,
                )),
                Constructor::Conveyor => {
                    return Err(EtlError::UnsupportedComponent(ComponentKind::Conveyor.as_str()).into());
                }
            };

            let component_id = component.id().clone();
            graph.add_component(component)?;
            for dep in &register.dependencies {
                let upstream = produced.get(dep).ok_or(EtlError::RegisterNotFound(*dep))?;
                graph.add_edge(upstream, &component_id)?;
            }
            produced.insert(register.data_type, component_id);
        }

        let terminal = graph
            .terminal()
            .ok_or_else(|| EtlError::RegisterNotFound(cfg.data_type))?;
        terminal.router().add_route(
            ENGINE_ROUTE,
            Outlet::Engine {
                path_id: id.clone(),
                tx: self.engine_tx.clone(),
            },
        )?;

        Path::new(id.clone(), cfg.clone(), graph, self.events_tx.clone())
    }

    /// Restarts the event loops of a stopped path.
    pub fn run_path(
        &self,
        id: &PathId,
    ) -> Result<()> {
        self.store.get(id)?.run(&self.shutdown)
    }

    /// Halts a path's loops without releasing it.
    pub async fn stop_path(
        &self,
        id: &PathId,
    ) -> Result<()> {
        self.store.get(id)?.stop().await;
        Ok(())
    }

    /// Drops one reference on `id`; the last one tears the path down.
    ///
    /// Returns whether the path was torn down.
    pub async fn release_path(
        &self,
        id: &PathId,
    ) -> Result<bool> {
        let Some(path) = self.store.release(id)? else {
            debug!(path_id = %id, refs = ?self.store.ref_count(id), "path reference released");
            return Ok(false);
        };

        path.teardown().await;
        ACTIVE_PATHS.set(self.store.len() as i64);
        info!(path_id = %id, "path released");
        Ok(true)
    }

    /// Last height emitted by the path's source
    pub fn path_height(
        &self,
        id: &PathId,
    ) -> Result<Option<u64>> {
        Ok(self.store.get(id)?.height())
    }

    pub fn path_state(
        &self,
        id: &PathId,
    ) -> Result<PathState> {
        Ok(self.store.get(id)?.state())
    }

    pub fn ref_count(
        &self,
        id: &PathId,
    ) -> Option<usize> {
        self.store.ref_count(id)
    }

    /// Number of built paths, running or not
    pub fn active_count(&self) -> usize {
        self.store.len()
    }

    /// Supervises path lifecycle events until shutdown.
    pub async fn event_loop(self: Arc<Self>) -> Result<()> {
        let mut events = self
            .events_rx
            .lock()
            .take()
            .ok_or_else(|| Error::Fatal("etl event loop already started".into()))?;
        info!("etl manager started");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    info!("etl manager shutting down");
                    return Ok(());
                }
                Some(event) = events.recv() => self.handle_event(event),
            }
        }
    }

    fn handle_event(
        &self,
        event: PathEvent,
    ) {
        match event {
            PathEvent::Completed(id) => {
                let height = self.path_height(&id).ok().flatten();
                info!(path_id = %id, ?height, "path completed");
            }
            PathEvent::Crashed { path_id, reason } => {
                error!(%path_id, %reason, "path crashed");
                if self.store.ref_count(&path_id).is_none() {
                    warn!(%path_id, "crashed path is no longer stored");
                }
            }
        }
    }

    /// Tears down every path, then stops supervision.
    pub async fn shutdown(&self) {
        let paths = self.store.drain();
        info!(paths = paths.len(), "tearing down paths");
        for path in paths {
            path.teardown().await;
        }
        ACTIVE_PATHS.set(0);
        self.shutdown.cancel();
    }
}
