//! Order Model

use serde::{Deserialize, Serialize};

use crate::order::{OrderStatus, PaymentStatus};

/// Order row. Created atomically with its lines; after creation only
/// `order_status` (and `updated_at`) ever change. All lines reference menu
/// items from `canteen_id`, which is immutable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub canteen_id: i64,
    /// Requested pickup time (millis since epoch), validated at creation only
    pub pickup_time: i64,
    #[serde(default)]
    pub special_instructions: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line - immutable once written. Name, description and unit price are
/// snapshotted at order time; later menu edits never alter historical orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub order_id: i64,
    pub seq: i64,
    pub item_id: i64,
    pub item_name: String,
    #[serde(default)]
    pub item_description: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
}

/// Order with its lines, as returned to API clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}
