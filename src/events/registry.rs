//! Listener registry keyed by event name.
//!
//! Listeners fire in registration order. Emission iterates a snapshot
//! taken when the pass begins: listeners added or removed from inside a
//! callback do not affect the in-progress pass. One-shot listeners are
//! claimed by the pass that snapshots them, so they fire at most once
//! even if a second emit begins while callbacks are still running.

use std::collections::HashMap;
use std::sync::Arc;

use super::{Callback, EventPayload};

/// Identifier assigned to a registered listener.
///
/// Ids are unique per registry and strictly increasing; they allow
/// targeted removal when the caller did not keep the callback `Arc`.
pub type ListenerId = u64;

/// One registered listener.
struct ListenerRecord {
    id: ListenerId,
    callback: Callback,
    once: bool,
}

/// Ordered mapping from event name to listener list.
pub struct ListenerRegistry {
    listeners: HashMap<String, Vec<ListenerRecord>>,
    next_id: ListenerId,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 1,
        }
    }

    /// Register a persistent listener for `event`.
    pub fn on(&mut self, event: &str, callback: Callback) -> ListenerId {
        self.insert(event, callback, false)
    }

    /// Register a one-shot listener for `event`.
    pub fn once(&mut self, event: &str, callback: Callback) -> ListenerId {
        self.insert(event, callback, true)
    }

    fn insert(&mut self, event: &str, callback: Callback, once: bool) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;

        self.listeners
            .entry(event.to_string())
            .or_default()
            .push(ListenerRecord { id, callback, once });
        id
    }

    /// Remove the first listener on `event` whose callback is the same
    /// `Arc` as `callback`. Identity match only; a separately registered
    /// clone of the same closure is a different listener. No-op when
    /// nothing matches.
    pub fn off(&mut self, event: &str, callback: &Callback) {
        if let Some(list) = self.listeners.get_mut(event) {
            if let Some(pos) = list.iter().position(|r| Arc::ptr_eq(&r.callback, callback)) {
                list.remove(pos);
            }
        }
    }

    /// Remove a listener on `event` by its assigned id.
    pub fn off_id(&mut self, event: &str, id: ListenerId) {
        if let Some(list) = self.listeners.get_mut(event) {
            list.retain(|r| r.id != id);
        }
    }

    /// Drop every listener registered for `event`.
    pub fn off_event(&mut self, event: &str) {
        self.listeners.remove(event);
    }

    /// Clear the entire registry.
    pub fn off_all(&mut self) {
        self.listeners.clear();
    }

    /// Number of listeners currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }

    /// Snapshot the listeners for `event` and claim its one-shot
    /// records.
    ///
    /// Returns the callbacks to invoke, in registration order. The
    /// caller invokes them without holding any lock on the registry;
    /// re-entrant `on`/`off` calls affect later passes only.
    pub fn begin_emit(&mut self, event: &str) -> Vec<Callback> {
        let Some(list) = self.listeners.get_mut(event) else {
            return Vec::new();
        };

        let snapshot = list.iter().map(|r| r.callback.clone()).collect();
        list.retain(|r| !r.once);
        snapshot
    }

    /// Invoke every listener registered for `event`, in registration
    /// order, then drop the one-shot records that fired.
    pub fn emit(&mut self, event: &str, payload: &EventPayload) {
        for callback in self.begin_emit(event) {
            callback(payload);
        }
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
