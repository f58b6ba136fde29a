//! Data models
//!
//! Shared between canteen-server and frontends (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY, snowflake-generated).

pub mod canteen;
pub mod cart;
pub mod menu_item;
pub mod order;

// Re-exports
pub use canteen::*;
pub use cart::*;
pub use menu_item::*;
pub use order::*;
