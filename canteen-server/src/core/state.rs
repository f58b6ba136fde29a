use std::sync::Arc;

use sqlx::SqlitePool;

use crate::core::Config;
use crate::db::DbService;
use crate::live::CanteenHub;

/// Server state - shared handles for every request handler.
///
/// Cloning is shallow (`Arc`/pool handles). The hub is an explicit
/// dependency here rather than a global: services receive it from state,
/// which keeps tests free to substitute their own instance.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration (immutable)
    pub config: Config,
    /// SQLite connection pool (store of record)
    pub pool: SqlitePool,
    /// Per-canteen broadcast hub
    pub hub: Arc<CanteenHub>,
}

impl ServerState {
    pub fn new(config: Config, pool: SqlitePool, hub: Arc<CanteenHub>) -> Self {
        Self { config, pool, hub }
    }

    /// Initialize state: open the database (running migrations) and create
    /// the broadcast hub.
    ///
    /// # Panics
    ///
    /// Panics when the database cannot be opened or migrated - the server
    /// cannot run without its store of record.
    pub async fn initialize(config: &Config) -> Self {
        let db = DbService::new(&config.database_path)
            .await
            .expect("Failed to initialize database");

        Self::new(config.clone(), db.pool, Arc::new(CanteenHub::new()))
    }
}
