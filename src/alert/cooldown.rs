use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::core::SessionId;

#[derive(Debug, Clone, Copy)]
struct CooldownEntry {
    window: Duration,
    last_delivered: Option<Instant>,
}

/// Per session record of the last delivered alert
///
/// The window is measured from the last delivery, never from the last
/// trigger. Sessions without an entry are treated as never alerted.
#[derive(Debug, Default)]
pub struct CooldownTable {
    entries: HashMap<SessionId, CooldownEntry>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `id`. Re-registering only replaces the window; the
    /// last delivery time is kept.
    pub fn register(
        &mut self,
        id: SessionId,
        window: Duration,
    ) {
        self.entries
            .entry(id)
            .and_modify(|entry| entry.window = window)
            .or_insert(CooldownEntry {
                window,
                last_delivered: None,
            });
    }

    pub fn remove(
        &mut self,
        id: &SessionId,
    ) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn contains(
        &self,
        id: &SessionId,
    ) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns `true` and records `now` as the delivery time when an alert
    /// for `id` may be delivered, `false` while the session is cooling down.
    pub fn try_acquire(
        &mut self,
        id: &SessionId,
        now: Instant,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            return true;
        };

        if let Some(last) = entry.last_delivered {
            if now.saturating_duration_since(last) < entry.window {
                return false;
            }
        }
        entry.last_delivered = Some(now);
        true
    }

    /// Remaining suppression time of `id` at `now`
    pub fn remaining(
        &self,
        id: &SessionId,
        now: Instant,
    ) -> Option<Duration> {
        let entry = self.entries.get(id)?;
        let last = entry.last_delivered?;
        entry.window.checked_sub(now.saturating_duration_since(last)).filter(|d| !d.is_zero())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
