//! Cart Repository
//!
//! The cart tables are owned by the cart subsystem. This engine consumes a
//! snapshot at checkout (joined with each item's canteen for the homogeneity
//! check) and clears the cart inside the committing transaction.

use sqlx::{SqliteConnection, SqlitePool};

use shared::models::CartLine;

use super::RepoResult;

#[derive(Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Snapshot the user's cart inside the checkout transaction.
    pub async fn snapshot(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
    ) -> RepoResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT c.user_id, c.item_id, c.quantity, m.canteen_id
              FROM cart_items c
              JOIN menu_items m ON m.id = c.item_id
             WHERE c.user_id = ?
             ORDER BY c.item_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(lines)
    }

    /// Clear the user's cart; part of the same transaction as the order
    /// insert, so an aborted checkout leaves the cart untouched.
    pub async fn clear(&self, conn: &mut SqliteConnection, user_id: i64) -> RepoResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Number of lines currently in the user's cart.
    pub async fn line_count(&self, user_id: i64) -> RepoResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

#[cfg(test)]
impl CartRepository {
    /// Test seam - in production these rows are written by the cart
    /// subsystem, never by this engine.
    pub async fn add_line(&self, user_id: i64, item_id: i64, quantity: i64) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO cart_items (user_id, item_id, quantity) VALUES (?, ?, ?)
             ON CONFLICT (user_id, item_id) DO UPDATE SET quantity = excluded.quantity",
        )
        .bind(user_id)
        .bind(item_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
