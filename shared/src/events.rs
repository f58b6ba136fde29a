//! Broadcast event payloads
//!
//! Ephemeral facts emitted after a committed inventory change. They are
//! consumed once by the canteen hub and never persisted - inventory truth
//! lives in the store, not in the broadcast.

use serde::{Deserialize, Serialize};

use crate::models::MenuItem;

/// Fact describing the post-commit state of one menu item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryDelta {
    pub canteen_id: i64,
    pub item_id: i64,
    pub name: String,
    pub available_quantity: i64,
    pub is_available: bool,
    pub category: String,
    pub is_vegetarian: bool,
    pub timestamp: i64,
}

impl InventoryDelta {
    /// Snapshot the broadcast-relevant fields of a committed item row.
    pub fn from_item(item: &MenuItem, timestamp: i64) -> Self {
        Self {
            canteen_id: item.canteen_id,
            item_id: item.id,
            name: item.name.clone(),
            available_quantity: item.available_quantity,
            is_available: item.is_available,
            category: item.category.clone(),
            is_vegetarian: item.is_vegetarian,
            timestamp,
        }
    }
}

/// Derived alert, emitted only on the edge crossing from above the threshold
/// to at-or-below it while quantity is still positive. The zero case is an
/// availability change, not a low-stock alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LowStockAlert {
    pub canteen_id: i64,
    pub item_id: i64,
    pub name: String,
    pub available_quantity: i64,
    pub threshold: i64,
    pub timestamp: i64,
}

/// Emitted when `is_available` flips, independent of quantity messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityChange {
    pub canteen_id: i64,
    pub item_id: i64,
    pub name: String,
    pub is_available: bool,
    pub timestamp: i64,
}

/// Events published on a canteen's channel.
///
/// Wire form: `{"type": "low-stock-alert", "payload": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum MenuEvent {
    MenuItemUpdated(InventoryDelta),
    MenuAvailabilityChanged(AvailabilityChange),
    LowStockAlert(LowStockAlert),
    MenuItemAdded(MenuItem),
    MenuItemRemoved { canteen_id: i64, item_id: i64, timestamp: i64 },
}

impl MenuEvent {
    /// The channel this event belongs to.
    pub fn canteen_id(&self) -> i64 {
        match self {
            MenuEvent::MenuItemUpdated(d) => d.canteen_id,
            MenuEvent::MenuAvailabilityChanged(c) => c.canteen_id,
            MenuEvent::LowStockAlert(a) => a.canteen_id,
            MenuEvent::MenuItemAdded(item) => item.canteen_id,
            MenuEvent::MenuItemRemoved { canteen_id, .. } => *canteen_id,
        }
    }
}
