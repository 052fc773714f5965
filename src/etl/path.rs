use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::ComponentGraph;
use super::ComponentKind;
use super::LoopExit;
use super::SharedComponent;
use crate::core::PathConfig;
use crate::core::PathId;
use crate::EtlError;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    /// Built or stopped; no loop is running
    Inactive,
    Active,
    /// Extraction range exhausted and fully drained
    Completed,
    /// A component loop returned an error
    Crashed,
}

impl PathState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathState::Inactive => "inactive",
            PathState::Active => "active",
            PathState::Completed => "completed",
            PathState::Crashed => "crashed",
        }
    }
}

/// Lifecycle notifications consumed by the ETL supervisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathEvent {
    Completed(PathId),
    Crashed { path_id: PathId, reason: String },
}

struct RunningComponent {
    component: SharedComponent,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// A running chain of components producing one data type stream
pub struct Path {
    id: PathId,
    config: PathConfig,
    graph: ComponentGraph,
    state: Arc<Mutex<PathState>>,
    running: Mutex<Vec<RunningComponent>>,
    events: mpsc::UnboundedSender<PathEvent>,
}

impl Path {
    pub fn new(
        id: PathId,
        config: PathConfig,
        graph: ComponentGraph,
        events: mpsc::UnboundedSender<PathEvent>,
    ) -> Result<Self> {
        if graph.is_empty() {
            return Err(EtlError::ComponentNotFound(format!("{id} (empty path)")).into());
        }
        Ok(Self {
            id,
            config,
            graph,
            state: Arc::new(Mutex::new(PathState::Inactive)),
            running: Mutex::new(Vec::new()),
            events,
        })
    }

    pub fn id(&self) -> &PathId {
        &self.id
    }

    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    pub fn state(&self) -> PathState {
        *self.state.lock()
    }

    pub fn graph(&self) -> &ComponentGraph {
        &self.graph
    }

    /// Last height emitted by the path's source
    pub fn height(&self) -> Option<u64> {
        self.graph
            .components()
            .iter()
            .find(|c| c.kind() == ComponentKind::Extractor)
            .and_then(|c| c.height())
    }

    /// Spawns one task per component. Only an inactive path can run.
    pub fn run(
        &self,
        parent: &CancellationToken,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if *state != PathState::Inactive {
            return Err(EtlError::InvalidPathState {
                id: self.id.clone(),
                action: "run",
                state: state.as_str(),
            }
            .into());
        }

        let terminal = self.graph.terminal().map(|c| c.id().clone());
        let mut running = self.running.lock();
        for component in self.graph.components() {
            let token = parent.child_token();
            let is_terminal = terminal.as_ref() == Some(component.id());
            let handle = tokio::spawn(supervise(
                component.clone(),
                token.clone(),
                self.id.clone(),
                is_terminal,
                self.state.clone(),
                self.events.clone(),
            ));
            running.push(RunningComponent {
                component,
                token,
                handle,
            });
        }

        *state = PathState::Active;
        info!(path_id = %self.id, components = running.len(), "path running");
        Ok(())
    }

    /// Halts every loop, upstream first, keeping the graph for a later run.
    pub async fn stop(&self) {
        let running = std::mem::take(&mut *self.running.lock());
        for r in running {
            r.token.cancel();
            join(&self.id, r).await;
        }

        let mut state = self.state.lock();
        if *state == PathState::Active {
            *state = PathState::Inactive;
        }
        info!(path_id = %self.id, "path stopped");
    }

    /// Drain-then-close teardown.
    ///
    /// Sources are cancelled and their routers closed; downstream components
    /// then drain their buffered input and end on stream closure, closing
    /// their own routers in turn. No send is interrupted midway.
    pub async fn teardown(&self) {
        // Leaving Active first keeps the drain from reporting a completion.
        {
            let mut state = self.state.lock();
            if *state == PathState::Active {
                *state = PathState::Inactive;
            }
        }
        let running = std::mem::take(&mut *self.running.lock());
        let (sources, downstream): (Vec<_>, Vec<_>) = running
            .into_iter()
            .partition(|r| r.component.kind() == ComponentKind::Extractor);

        for r in sources {
            r.token.cancel();
            let component = r.component.clone();
            join(&self.id, r).await;
            component.router().close();
        }
        for r in downstream {
            join(&self.id, r).await;
        }
        for component in self.graph.components() {
            component.router().close();
        }
        info!(path_id = %self.id, "path torn down");
    }
}

async fn join(
    path_id: &PathId,
    running: RunningComponent,
) {
    if let Err(e) = running.handle.await {
        warn!(%path_id, component_id = %running.component.id(), "component task ended abnormally: {:?}", e);
    }
}

async fn supervise(
    component: SharedComponent,
    token: CancellationToken,
    path_id: PathId,
    is_terminal: bool,
    state: Arc<Mutex<PathState>>,
    events: mpsc::UnboundedSender<PathEvent>,
) {
    match component.event_loop(token).await {
        Ok(LoopExit::Cancelled) => {
            debug!(%path_id, component_id = %component.id(), "component loop cancelled");
        }
        Ok(LoopExit::Completed) => {
            component.router().close();
            if is_terminal {
                let completed = {
                    let mut state = state.lock();
                    let active = *state == PathState::Active;
                    if active {
                        *state = PathState::Completed;
                    }
                    active
                };
                if completed {
                    let _ = events.send(PathEvent::Completed(path_id));
                }
            }
        }
        Err(e) => {
            error!(%path_id, component_id = %component.id(), "component loop failed: {:?}", e);
            // Crashed must be visible before downstream sees its input close
            *state.lock() = PathState::Crashed;
            component.router().close();
            let _ = events.send(PathEvent::Crashed {
                path_id,
                reason: e.to_string(),
            });
        }
    }
}
