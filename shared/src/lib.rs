//! Shared domain types for the campus canteen storefront.
//!
//! Used by canteen-server and by API clients (via JSON). Row types derive
//! `sqlx::FromRow` behind the `db` feature so front-end consumers don't pull
//! in the database stack.
//!
//! # Modules
//!
//! - `models` - menu items, orders, cart snapshot rows
//! - `order` - order/payment status enums and the transition table
//! - `events` - broadcast payloads (inventory deltas, low-stock alerts)
//! - `util` - timestamps and snowflake ID generation

pub mod events;
pub mod models;
pub mod order;
pub mod util;

pub use events::{AvailabilityChange, InventoryDelta, LowStockAlert, MenuEvent};
pub use order::{ActorRole, OrderStatus, PaymentStatus};
