// src/bus.rs
//! Typed in-process event bus for cross-component notifications ("cart
//! changed", "favorites changed"). Subscribers hold a receiver for their
//! lifetime and drop it on teardown; a lagging subscriber misses events
//! instead of stalling the publisher.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "evento", rename_all = "snake_case")]
pub enum StoreEvent {
    CartChanged { user_id: i64, total_items: u32 },
    FavoritesChanged { user_id: i64, total: u32 },
    CatalogRefreshed { items: usize },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Fire-and-forget: with no live subscribers the event is simply dropped.
    pub fn publish(&self, event: StoreEvent) {
        debug!(?event, "store event");
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
