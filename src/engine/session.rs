use std::sync::Arc;

use dashmap::DashMap;

use super::Heuristic;
use crate::core::AlertPolicy;
use crate::core::HeuristicType;
use crate::core::Network;
use crate::core::PathId;
use crate::core::SessionId;

/// A deployed heuristic bound to one path
pub struct HeuristicSession {
    pub id: SessionId,
    pub path_id: PathId,
    pub network: Network,
    pub heuristic_type: HeuristicType,
    pub policy: AlertPolicy,
    pub heuristic: Box<dyn Heuristic>,
}

/// Active sessions by id
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, Arc<HeuristicSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &self,
        session: HeuristicSession,
    ) -> Arc<HeuristicSession> {
        let session = Arc::new(session);
        self.sessions.insert(session.id.clone(), session.clone());
        session
    }

    pub fn get(
        &self,
        id: &SessionId,
    ) -> Option<Arc<HeuristicSession>> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    pub fn remove(
        &self,
        id: &SessionId,
    ) -> Option<Arc<HeuristicSession>> {
        self.sessions.remove(id).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Path to subscribed sessions, in deployment order
#[derive(Default)]
pub struct AddressingMap {
    paths: DashMap<PathId, Vec<SessionId>>,
}

impl AddressingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        path_id: PathId,
        session: SessionId,
    ) {
        self.paths.entry(path_id).or_default().push(session);
    }

    /// Returns whether the session was subscribed to `path_id`
    pub fn unsubscribe(
        &self,
        path_id: &PathId,
        session: &SessionId,
    ) -> bool {
        let mut removed = false;
        if let Some(mut sessions) = self.paths.get_mut(path_id) {
            let before = sessions.len();
            sessions.retain(|s| s != session);
            removed = sessions.len() != before;
        }
        self.paths.remove_if(path_id, |_, sessions| sessions.is_empty());
        removed
    }

    /// Snapshot of the sessions addressed to `path_id`
    pub fn sessions(
        &self,
        path_id: &PathId,
    ) -> Vec<SessionId> {
        self.paths.get(path_id).map(|s| s.value().clone()).unwrap_or_default()
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }
}
