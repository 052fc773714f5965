//! Component runtime: extractor and transform event loops.
//!
//! Both loop kinds select between their data producing step and the
//! shutdown token. Cancellation is only observed between units, so a unit
//! that started is always fully written to the router.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::Router;
use crate::config::RouterConfig;
use crate::core::Network;
use crate::core::PathMode;
use crate::core::RegisterType;
use crate::core::TransitData;
use crate::metrics::RPC_FAILURES;
use crate::metrics::TRANSIT_EMITTED;
use crate::ClientError;
use crate::Error;
use crate::EtlError;
use crate::Result;

/// Floor applied to poll intervals; a zero period cannot drive a ticker
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Sources data from an RPC client
    Extractor,
    /// Derives data from one upstream stream
    Transform,
    /// Relays another path's output; no constructor exists for it yet
    Conveyor,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Extractor => "extractor",
            ComponentKind::Transform => "transform",
            ComponentKind::Conveyor => "conveyor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(String);

impl ComponentId {
    pub fn new(
        kind: ComponentKind,
        output: RegisterType,
    ) -> Self {
        ComponentId(format!("{}:{}:{}", kind.as_str(), output, nanoid::nanoid!(10)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How an event loop ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Shutdown token fired
    Cancelled,
    /// Range exhausted (extractor) or input closed (transform)
    Completed,
}

/// Data source behind an extractor
#[async_trait]
pub trait ExtractorDefinition: Send + Sync {
    /// Fetches the unit at `height`, or at the chain tip for `None`.
    /// `BlockNotFound` means the height is not produced yet; any other
    /// error is treated as a transient failure by the poll loop.
    async fn extract(
        &self,
        height: Option<u64>,
    ) -> Result<TransitData>;
}

/// Pure mapping applied by a transform to each input unit
pub trait TransformDefinition: Send + Sync {
    fn transform(
        &self,
        input: TransitData,
    ) -> Result<Vec<TransitData>>;
}

#[async_trait]
pub trait Component: Send + Sync {
    fn id(&self) -> &ComponentId;

    fn kind(&self) -> ComponentKind;

    fn output_type(&self) -> RegisterType;

    fn router(&self) -> &Router;

    /// Sender feeding this component, `None` for sources
    fn input(&self) -> Option<mpsc::Sender<TransitData>>;

    /// Last height this component emitted
    fn height(&self) -> Option<u64>;

    async fn event_loop(
        &self,
        shutdown: CancellationToken,
    ) -> Result<LoopExit>;
}

/// Polling window of an extractor
#[derive(Debug, Clone, Copy)]
pub struct ExtractorSettings {
    pub network: Network,
    pub mode: PathMode,
    pub poll_interval: Duration,
    pub start_height: Option<u64>,
    pub end_height: Option<u64>,
    /// Consecutive RPC failures tolerated in backtest mode
    pub max_retries: usize,
}

#[derive(Debug, Default)]
struct Cursor {
    /// Next height to request; `None` means the chain tip
    next: Option<u64>,
    last: Option<u64>,
}

pub struct Extractor {
    id: ComponentId,
    output: RegisterType,
    settings: ExtractorSettings,
    definition: Box<dyn ExtractorDefinition>,
    router: Router,
    cursor: Mutex<Cursor>,
}

impl Extractor {
    pub fn new(
        output: RegisterType,
        settings: ExtractorSettings,
        definition: Box<dyn ExtractorDefinition>,
        router_config: &RouterConfig,
    ) -> Self {
        let id = ComponentId::new(ComponentKind::Extractor, output);
        let router = Router::new(id.to_string(), router_config.policy);
        Self {
            id,
            output,
            settings,
            definition,
            router,
            cursor: Mutex::new(Cursor {
                next: settings.start_height,
                last: None,
            }),
        }
    }

    fn range_exhausted(&self) -> bool {
        let cursor = self.cursor.lock();
        match (self.settings.end_height, cursor.next) {
            (Some(end), Some(next)) => next > end,
            _ => false,
        }
    }

    fn advance(
        &self,
        height: u64,
    ) {
        let mut cursor = self.cursor.lock();
        cursor.last = Some(height);
        cursor.next = Some(height.saturating_add(1));
    }
}

#[async_trait]
impl Component for Extractor {
    fn id(&self) -> &ComponentId {
        &self.id
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Extractor
    }

    fn output_type(&self) -> RegisterType {
        self.output
    }

    fn router(&self) -> &Router {
        &self.router
    }

    fn input(&self) -> Option<mpsc::Sender<TransitData>> {
        None
    }

    fn height(&self) -> Option<u64> {
        self.cursor.lock().last
    }

    async fn event_loop(
        &self,
        shutdown: CancellationToken,
    ) -> Result<LoopExit> {
        let network = self.settings.network;
        info!(component_id = %self.id, %network, "extractor started");

        let mut ticker = tokio::time::interval(self.settings.poll_interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut failures = 0usize;

        loop {
            if self.range_exhausted() {
                info!(component_id = %self.id, last_height = ?self.height(), "extraction range complete");
                return Ok(LoopExit::Completed);
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!(component_id = %self.id, "extractor cancelled");
                    return Ok(LoopExit::Cancelled);
                }
                _ = ticker.tick() => {}
            }

            let requested = self.cursor.lock().next;
            match self.definition.extract(requested).await {
                Ok(data) => {
                    failures = 0;
                    // Explicit requests advance by the requested height; tip
                    // requests by whatever height the tip resolved to.
                    let height = requested.unwrap_or_else(|| data.height());
                    if let Err(e) = self.router.send(data).await {
                        error!(component_id = %self.id, height, "failed to route extracted data: {:?}", e);
                    }
                    TRANSIT_EMITTED.with_label_values(&[network.as_str(), self.output.as_str()]).inc();
                    self.advance(height);
                }
                Err(Error::Client(ClientError::BlockNotFound(height))) => {
                    // The node has not produced this height yet
                    debug!(component_id = %self.id, height, "block not yet available");
                }
                Err(e) => {
                    failures += 1;
                    RPC_FAILURES.with_label_values(&[network.as_str()]).inc();
                    warn!(
                        component_id = %self.id,
                        height = ?requested,
                        failures,
                        "poll failed, retrying next tick: {:?}", e
                    );

                    if self.settings.mode == PathMode::Backtest && failures > self.settings.max_retries {
                        return Err(EtlError::BacktestRetriesExhausted {
                            height: requested.unwrap_or_default(),
                            attempts: failures,
                        }
                        .into());
                    }
                }
            }
        }
    }
}

pub struct Transform {
    id: ComponentId,
    output: RegisterType,
    definition: Box<dyn TransformDefinition>,
    router: Router,
    /// Released when the loop first starts so upstream closure ends the stream
    input_tx: Mutex<Option<mpsc::Sender<TransitData>>>,
    input_rx: tokio::sync::Mutex<mpsc::Receiver<TransitData>>,
    last: Mutex<Option<u64>>,
}

impl Transform {
    pub fn new(
        output: RegisterType,
        definition: Box<dyn TransformDefinition>,
        router_config: &RouterConfig,
    ) -> Self {
        let id = ComponentId::new(ComponentKind::Transform, output);
        let router = Router::new(id.to_string(), router_config.policy);
        let (tx, rx) = mpsc::channel(router_config.capacity);
        Self {
            id,
            output,
            definition,
            router,
            input_tx: Mutex::new(Some(tx)),
            input_rx: tokio::sync::Mutex::new(rx),
            last: Mutex::new(None),
        }
    }

    async fn process(
        &self,
        data: TransitData,
    ) {
        let height = data.height();
        let outputs = match self.definition.transform(data) {
            Ok(outputs) => outputs,
            Err(e) => {
                error!(component_id = %self.id, height, "transform failed: {:?}", e);
                return;
            }
        };

        for item in outputs {
            if let Err(e) = self.router.send(item).await {
                error!(component_id = %self.id, height, "failed to route transformed data: {:?}", e);
            }
        }
        *self.last.lock() = Some(height);
    }
}

#[async_trait]
impl Component for Transform {
    fn id(&self) -> &ComponentId {
        &self.id
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Transform
    }

    fn output_type(&self) -> RegisterType {
        self.output
    }

    fn router(&self) -> &Router {
        &self.router
    }

    fn input(&self) -> Option<mpsc::Sender<TransitData>> {
        self.input_tx.lock().clone()
    }

    fn height(&self) -> Option<u64> {
        *self.last.lock()
    }

    async fn event_loop(
        &self,
        shutdown: CancellationToken,
    ) -> Result<LoopExit> {
        let mut rx = self.input_rx.lock().await;
        self.input_tx.lock().take();
        info!(component_id = %self.id, "transform started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!(component_id = %self.id, "transform cancelled");
                    return Ok(LoopExit::Cancelled);
                }
                maybe = rx.recv() => match maybe {
                    Some(data) => self.process(data).await,
                    None => {
                        info!(component_id = %self.id, "input closed, transform complete");
                        return Ok(LoopExit::Completed);
                    }
                }
            }
        }
    }
}

/// Convenience for call sites holding components behind trait objects
pub type SharedComponent = Arc<dyn Component>;
