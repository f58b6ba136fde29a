//! Derivation of broadcast events from committed item state.
//!
//! Called after a transaction commits, with the item rows as read before
//! and after the change inside that transaction. Keeps the fanout layer
//! consistent with persisted state: what was committed is what is announced.

use shared::events::{AvailabilityChange, InventoryDelta, LowStockAlert, MenuEvent};
use shared::models::MenuItem;
use shared::util::now_millis;

use super::CanteenHub;

/// Publish the events derived from one item's committed change:
/// the inventory delta, an availability flip when `is_available` changed,
/// and a low-stock alert on the above→at-or-below threshold edge.
///
/// Emission order per item is fixed (delta, availability, alert); the hub
/// preserves it per subscriber.
pub fn publish_stock_change(
    hub: &CanteenHub,
    threshold: i64,
    before: &MenuItem,
    after: &MenuItem,
) {
    let ts = now_millis();

    hub.publish(MenuEvent::MenuItemUpdated(InventoryDelta::from_item(after, ts)));

    if before.is_available != after.is_available {
        hub.publish(MenuEvent::MenuAvailabilityChanged(AvailabilityChange {
            canteen_id: after.canteen_id,
            item_id: after.id,
            name: after.name.clone(),
            is_available: after.is_available,
            timestamp: ts,
        }));
    }

    // Edge-triggered: nothing fires while the item is already at or below
    // the threshold, and the zero case is an availability change instead.
    if after.available_quantity > 0
        && before.available_quantity > threshold
        && after.available_quantity <= threshold
    {
        hub.publish(MenuEvent::LowStockAlert(LowStockAlert {
            canteen_id: after.canteen_id,
            item_id: after.id,
            name: after.name.clone(),
            available_quantity: after.available_quantity,
            threshold,
            timestamp: ts,
        }));
    }
}
