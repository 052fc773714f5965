use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::Path;
use crate::core::PathId;
use crate::EtlError;
use crate::Result;

struct Entry {
    path: Arc<Path>,
    refs: usize,
}

/// Reference counted table of built paths keyed by identity
#[derive(Default)]
pub struct PathStore {
    paths: Mutex<HashMap<PathId, Entry>>,
}

impl PathStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a reference on `id`, building the path when it is absent.
    ///
    /// `build` runs under the store lock, so two concurrent requests for the
    /// same identity never both construct. New paths count against `limit`.
    /// Returns the path and whether it already existed.
    pub fn acquire_or_insert<F>(
        &self,
        id: &PathId,
        limit: usize,
        build: F,
    ) -> Result<(Arc<Path>, bool)>
    where
        F: FnOnce() -> Result<Path>,
    {
        let mut paths = self.paths.lock();
        if let Some(entry) = paths.get_mut(id) {
            entry.refs += 1;
            return Ok((entry.path.clone(), true));
        }

        if paths.len() >= limit {
            return Err(EtlError::PathLimitReached(limit).into());
        }

        let path = Arc::new(build()?);
        paths.insert(
            id.clone(),
            Entry {
                path: path.clone(),
                refs: 1,
            },
        );
        Ok((path, false))
    }

    pub fn get(
        &self,
        id: &PathId,
    ) -> Result<Arc<Path>> {
        self.paths
            .lock()
            .get(id)
            .map(|e| e.path.clone())
            .ok_or_else(|| EtlError::PathNotFound(id.clone()).into())
    }

    /// Drops one reference. The path is removed and handed back for teardown
    /// once no reference is left.
    pub fn release(
        &self,
        id: &PathId,
    ) -> Result<Option<Arc<Path>>> {
        let mut paths = self.paths.lock();
        let entry = paths.get_mut(id).ok_or_else(|| EtlError::PathNotFound(id.clone()))?;
        entry.refs = entry.refs.saturating_sub(1);
        if entry.refs > 0 {
            return Ok(None);
        }
        Ok(paths.remove(id).map(|e| e.path))
    }

    pub fn ref_count(
        &self,
        id: &PathId,
    ) -> Option<usize> {
        self.paths.lock().get(id).map(|e| e.refs)
    }

    /// Removes every path regardless of references
    pub fn drain(&self) -> Vec<Arc<Path>> {
        self.paths.lock().drain().map(|(_, e)| e.path).collect()
    }

    pub fn len(&self) -> usize {
        self.paths.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.lock().is_empty()
    }
}
