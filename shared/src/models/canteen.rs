//! Canteen Model

use serde::{Deserialize, Serialize};

/// A single dining outlet - the scoping unit for menus, orders and
/// broadcast channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Canteen {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub is_open: bool,
}
