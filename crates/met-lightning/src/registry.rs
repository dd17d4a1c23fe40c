//! Host side of the event lifecycle.
//!
//! The reconciler never owns events once they are created. It hands them to
//! an [`EntityRegistrar`] in one batch per cycle and later asks for them to
//! be removed by strike identifier.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::event::{GeolocationEvent, LightningEvent};

/// Entity lifecycle operations the reconciler depends on.
///
/// Both calls are fire-and-forget from the reconciler's point of view.
pub trait EntityRegistrar: Send + Sync {
    /// Add a batch of newly observed events. May be empty.
    fn register_batch(&self, events: Vec<LightningEvent>);

    /// Ask the event with this strike identifier to remove itself.
    fn request_removal(&self, strike_id: &str);
}

impl<R: EntityRegistrar + ?Sized> EntityRegistrar for std::sync::Arc<R> {
    fn register_batch(&self, events: Vec<LightningEvent>) {
        (**self).register_batch(events)
    }

    fn request_removal(&self, strike_id: &str) {
        (**self).request_removal(strike_id)
    }
}

/// In-process registry of live events, indexed by strike identifier.
///
/// Removal is a direct lookup on the index instead of a broadcast every
/// event has to filter.
#[derive(Debug, Default)]
pub struct EventRegistry {
    events: Mutex<HashMap<String, LightningEvent>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, strike_id: &str) -> bool {
        self.lock().contains_key(strike_id)
    }

    pub fn get(&self, strike_id: &str) -> Option<LightningEvent> {
        self.lock().get(strike_id).cloned()
    }

    /// Identifiers of all live events, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Rendered state of every live event, sorted by identifier.
    pub fn snapshot(&self) -> Vec<Value> {
        let events = self.lock();
        let mut ids: Vec<&String> = events.keys().collect();
        ids.sort();
        ids.into_iter().map(|id| events[id].state()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, LightningEvent>> {
        // Nothing panics while holding the lock, so a poisoned map is still consistent.
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EntityRegistrar for EventRegistry {
    fn register_batch(&self, events: Vec<LightningEvent>) {
        if events.is_empty() {
            return;
        }

        let mut live = self.lock();
        for mut event in events {
            event.added_to_host();
            log::info!(
                "Added {} ({:.1} {} away)",
                event.name(),
                event.distance(),
                event.unit_of_measurement()
            );
            live.insert(event.strike_id().to_string(), event);
        }
    }

    fn request_removal(&self, strike_id: &str) {
        let removed = self.lock().remove(strike_id);
        match removed {
            Some(mut event) => {
                event.handle_removal();
                log::info!("Removed {}", event.name());
            }
            None => log::debug!("No live event for strike {}", strike_id),
        }
    }
}
