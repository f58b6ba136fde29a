//! Menu Item Model

use serde::{Deserialize, Serialize};

/// Menu item entity.
///
/// Invariant: `is_available` is false whenever `available_quantity == 0`.
/// An administrator may additionally set it false with stock remaining
/// (explicit hide). Rows referenced by historical order items are never
/// deleted - removal is a soft disable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: i64,
    pub canteen_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_vegetarian: bool,
    /// Unit price in minor units (cents)
    pub price_cents: i64,
    /// Non-negative; mutated only through guarded conditional updates
    pub available_quantity: i64,
    pub is_available: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub canteen_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_vegetarian: Option<bool>,
    pub price_cents: i64,
    pub available_quantity: Option<i64>,
}

/// Partial update payload - each field optional, applied field-by-field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_vegetarian: Option<bool>,
    pub price_cents: Option<i64>,
    pub available_quantity: Option<i64>,
    pub is_available: Option<bool>,
}

impl MenuItemPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.is_vegetarian.is_none()
            && self.price_cents.is_none()
            && self.available_quantity.is_none()
            && self.is_available.is_none()
    }
}

/// Stock adjustment - relative delta or absolute replacement.
///
/// Wire form: `{"delta": -2}` or `{"absolute": 10}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockAdjustment {
    Delta(i64),
    Absolute(i64),
}

/// One entry of an administrator bulk stock update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStockEntry {
    pub item_id: i64,
    pub adjustment: StockAdjustment,
}

/// Per-item outcome of a bulk stock update. Failures never roll back
/// sibling successes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkStockOutcome {
    pub item_id: i64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
