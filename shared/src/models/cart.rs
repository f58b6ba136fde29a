//! Cart snapshot types
//!
//! The cart tables belong to the cart subsystem; the order engine only reads
//! a snapshot at checkout time and clears it on success.

use serde::{Deserialize, Serialize};

/// One cart line joined with its item's canteen, as read at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartLine {
    pub user_id: i64,
    pub item_id: i64,
    pub quantity: i64,
    /// Canteen of the referenced menu item; all lines of a checkout must agree
    pub canteen_id: i64,
}
