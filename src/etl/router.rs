//! Fan-out router owned by every component.
//!
//! A send writes the item to every registered outlet. With
//! [`SendPolicy::Block`] the slowest consumer sets the pace of the whole
//! path; [`SendPolicy::DropNewest`] trades that for liveness by discarding
//! the item for a full outlet.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;
use tracing::warn;

use crate::config::SendPolicy;
use crate::core::HeuristicInput;
use crate::core::PathId;
use crate::core::TransitData;
use crate::EtlError;
use crate::Result;

/// Route key used for the engine relay of a terminal component
pub const ENGINE_ROUTE: &str = "engine";

/// Downstream end of a route
#[derive(Debug, Clone)]
pub enum Outlet {
    /// Input channel of another component
    Component(mpsc::Sender<TransitData>),
    /// Engine ingress, tagged with the path the data belongs to
    Engine {
        path_id: PathId,
        tx: mpsc::Sender<HeuristicInput>,
    },
}

impl Outlet {
    async fn deliver(
        &self,
        data: TransitData,
        policy: SendPolicy,
    ) -> Delivery {
        match (self, policy) {
            (Outlet::Component(tx), SendPolicy::Block) => closed_or_sent(tx.send(data).await.is_ok()),
            (Outlet::Component(tx), SendPolicy::DropNewest) => try_result(tx.try_send(data)),
            (Outlet::Engine { path_id, tx }, SendPolicy::Block) => {
                let input = HeuristicInput {
                    path_id: path_id.clone(),
                    data,
                };
                closed_or_sent(tx.send(input).await.is_ok())
            }
            (Outlet::Engine { path_id, tx }, SendPolicy::DropNewest) => try_result(tx.try_send(HeuristicInput {
                path_id: path_id.clone(),
                data,
            })),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Delivery {
    Sent,
    Dropped,
    Closed,
}

fn closed_or_sent(ok: bool) -> Delivery {
    if ok {
        Delivery::Sent
    } else {
        Delivery::Closed
    }
}

fn try_result<T>(res: std::result::Result<(), TrySendError<T>>) -> Delivery {
    match res {
        Ok(()) => Delivery::Sent,
        Err(TrySendError::Full(_)) => Delivery::Dropped,
        Err(TrySendError::Closed(_)) => Delivery::Closed,
    }
}

/// Counts of one [`Router::send`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    pub sent: usize,
    pub dropped: usize,
    pub closed: usize,
}

#[derive(Debug)]
pub struct Router {
    owner: String,
    policy: SendPolicy,
    outlets: RwLock<BTreeMap<String, Outlet>>,
}

impl Router {
    pub fn new(
        owner: impl Into<String>,
        policy: SendPolicy,
    ) -> Self {
        Self {
            owner: owner.into(),
            policy,
            outlets: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn policy(&self) -> SendPolicy {
        self.policy
    }

    pub fn add_route(
        &self,
        key: impl Into<String>,
        outlet: Outlet,
    ) -> Result<()> {
        let key = key.into();
        let mut outlets = self.outlets.write();
        if outlets.contains_key(&key) {
            return Err(EtlError::RouteExists(key).into());
        }
        debug!(owner = %self.owner, route = %key, "route added");
        outlets.insert(key, outlet);
        Ok(())
    }

    pub fn remove_route(
        &self,
        key: &str,
    ) -> Result<()> {
        match self.outlets.write().remove(key) {
            Some(_) => Ok(()),
            None => Err(EtlError::RouteNotFound(key.to_string()).into()),
        }
    }

    pub fn has_route(
        &self,
        key: &str,
    ) -> bool {
        self.outlets.read().contains_key(key)
    }

    pub fn route_count(&self) -> usize {
        self.outlets.read().len()
    }

    /// Drops every outlet so downstream receivers observe the end of the
    /// stream once they have drained their buffers.
    pub fn close(&self) {
        self.outlets.write().clear();
    }

    /// Writes `data` to every outlet, in key order.
    ///
    /// Outlets are snapshotted first so no lock is held across an await.
    /// Outlets whose receiver is gone are reported as closed, not failed.
    pub async fn send(
        &self,
        data: TransitData,
    ) -> Result<SendReport> {
        let outlets: Vec<(String, Outlet)> = self
            .outlets
            .read()
            .iter()
            .map(|(k, o)| (k.clone(), o.clone()))
            .collect();

        if outlets.is_empty() {
            return Err(EtlError::NoRoutes(self.owner.clone()).into());
        }

        let mut report = SendReport::default();
        for (key, outlet) in outlets {
            match outlet.deliver(data.clone(), self.policy).await {
                Delivery::Sent => report.sent += 1,
                Delivery::Dropped => {
                    report.dropped += 1;
                    debug!(owner = %self.owner, route = %key, "outlet full, item dropped");
                }
                Delivery::Closed => {
                    report.closed += 1;
                    warn!(owner = %self.owner, route = %key, "outlet closed");
                }
            }
        }
        Ok(report)
    }
}
