//! CanteenHub - per-canteen real-time fanout
//!
//! Publish/subscribe hub scoped by canteen id. Inventory changes committed
//! by the order and inventory services are published here and fanned out to
//! every subscriber of that canteen's channel only.
//!
//! ```text
//! OrderService / InventoryService
//!       │ MenuEvent (post-commit)
//!       ▼
//! CanteenHub
//!   └── canteens: canteen_id → broadcast::Sender<MenuEvent>
//!             │
//!             ▼
//!   WS handlers / in-process subscribers (fan-out per canteen)
//! ```
//!
//! Delivery is at-least-once to subscribers connected at publish time; there
//! is no replay for late joiners and no persistence of missed events. A
//! publish snapshots the channel's receiver set (broadcast semantics), so
//! concurrent joins and leaves never corrupt a fanout in progress.

pub mod notify;

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use shared::events::MenuEvent;

/// Broadcast channel capacity - enough to absorb a bulk-update burst
const BROADCAST_CAPACITY: usize = 256;

/// One canteen's channel
struct CanteenChannel {
    tx: broadcast::Sender<MenuEvent>,
}

impl CanteenChannel {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { tx }
    }
}

/// Pub/sub hub keyed by canteen id. An explicit dependency of the services
/// that create/cancel orders and adjust stock - never an ambient global.
#[derive(Clone, Default)]
pub struct CanteenHub {
    canteens: Arc<DashMap<i64, CanteenChannel>>,
}

impl CanteenHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join a canteen's channel. Dropping the receiver leaves it.
    pub fn subscribe(&self, canteen_id: i64) -> broadcast::Receiver<MenuEvent> {
        self.canteens
            .entry(canteen_id)
            .or_insert_with(CanteenChannel::new)
            .downgrade()
            .tx
            .subscribe()
    }

    /// Publish to the event's canteen. Fire-and-forget: delivery failures
    /// (no subscribers, lagged receivers) never propagate to the committing
    /// caller - inventory truth lives in the store.
    pub fn publish(&self, event: MenuEvent) {
        if let Some(channel) = self.canteens.get(&event.canteen_id()) {
            // send errors only when no receiver is connected
            let _ = channel.tx.send(event);
        }
    }

    /// Current subscriber count for a canteen.
    pub fn subscriber_count(&self, canteen_id: i64) -> usize {
        self.canteens
            .get(&canteen_id)
            .map(|c| c.tx.receiver_count())
            .unwrap_or(0)
    }

    /// Drop a canteen's channel entry once its last subscriber left.
    /// Called when a connection closes; harmless if subscribers remain.
    pub fn prune(&self, canteen_id: i64) {
        if let Some(channel) = self.canteens.get(&canteen_id) {
            if channel.tx.receiver_count() == 0 {
                drop(channel);
                self.canteens.remove(&canteen_id);
            }
        }
    }
}
