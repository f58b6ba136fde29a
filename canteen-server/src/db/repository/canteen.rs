//! Canteen Repository
//!
//! Canteen rows are managed out-of-band (seeded by operations); the engine
//! only reads them.

use sqlx::SqlitePool;

use shared::models::Canteen;

use super::{RepoError, RepoResult};

#[derive(Clone)]
pub struct CanteenRepository {
    pool: SqlitePool,
}

impl CanteenRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Canteen>> {
        let canteens = sqlx::query_as::<_, Canteen>("SELECT * FROM canteens ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(canteens)
    }

    pub async fn get(&self, id: i64) -> RepoResult<Canteen> {
        sqlx::query_as::<_, Canteen>("SELECT * FROM canteens WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Canteen {id}")))
    }
}
