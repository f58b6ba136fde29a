//! Canteen Server - order and inventory consistency engine
//!
//! Backend for a campus food-ordering platform: atomic checkout against
//! live stock, a validated order state machine, and per-canteen broadcast
//! of inventory changes.
//!
//! # Module structure
//!
//! ```text
//! canteen-server/src/
//! ├── core/          # config, state, server, startup errors
//! ├── db/            # SQLite pool and repositories
//! ├── orders/        # checkout, status transitions, cancellation
//! ├── inventory/     # menu and stock administration
//! ├── live/          # per-canteen broadcast hub
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # errors, logging, validation
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod inventory;
pub mod live;
pub mod orders;
pub mod utils;

// Re-export common types
pub use core::{Config, Server, ServerState};
pub use inventory::InventoryService;
pub use live::CanteenHub;
pub use orders::{OrderError, OrderService};
pub use utils::{AppError, AppResponse, AppResult};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Environment setup: dotenv then logging. Call once before anything that
/// reads configuration.
pub fn setup_environment() {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());
}
