//! Menu Item Repository
//!
//! All stock mutations are guarded conditional UPDATEs: the availability
//! check and the decrement happen in one statement, so two concurrent
//! checkouts can never both pass a stale read and jointly oversell.

use sqlx::{SqliteConnection, SqlitePool};

use shared::models::{MenuItem, MenuItemCreate, MenuItemPatch};
use shared::util::{now_millis, snowflake_id};

use super::{RepoError, RepoResult};

#[derive(Clone)]
pub struct MenuItemRepository {
    pool: SqlitePool,
}

impl MenuItemRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    pub async fn find_by_canteen(&self, canteen_id: i64) -> RepoResult<Vec<MenuItem>> {
        let items = sqlx::query_as::<_, MenuItem>(
            "SELECT * FROM menu_items WHERE canteen_id = ? ORDER BY category, name",
        )
        .bind(canteen_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Fetch several items inside a transaction (checkout re-reads current
    /// rows here before snapshotting prices).
    pub async fn fetch_many(
        &self,
        conn: &mut SqliteConnection,
        ids: &[i64],
    ) -> RepoResult<Vec<MenuItem>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT * FROM menu_items WHERE id IN ({placeholders})");
        let mut query = sqlx::query_as::<_, MenuItem>(&sql);
        for id in ids {
            query = query.bind(id);
        }
        let items = query.fetch_all(&mut *conn).await?;
        Ok(items)
    }

    pub async fn create(&self, data: MenuItemCreate) -> RepoResult<MenuItem> {
        let now = now_millis();
        let quantity = data.available_quantity.unwrap_or(0);
        let item = sqlx::query_as::<_, MenuItem>(
            r#"
            INSERT INTO menu_items (
                id, canteen_id, name, description, category, is_vegetarian,
                price_cents, available_quantity, is_available, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(snowflake_id())
        .bind(data.canteen_id)
        .bind(&data.name)
        .bind(data.description.unwrap_or_default())
        .bind(data.category.unwrap_or_default())
        .bind(data.is_vegetarian.unwrap_or(false))
        .bind(data.price_cents)
        .bind(quantity)
        .bind(quantity > 0)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    /// Apply a partial update field-by-field.
    ///
    /// Stock and availability fields keep their guards: an absolute quantity
    /// of zero forces `is_available` off, and a patch that enables without
    /// supplying a quantity requires positive stock in the same statement
    /// (zero rows means the whole patch is rejected, no partial write).
    pub async fn apply_patch(&self, id: i64, patch: MenuItemPatch) -> RepoResult<MenuItem> {
        if patch.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Menu item {id}")));
        }

        // Enabling with no quantity in the patch depends on the stored
        // quantity; the guard keeps that check inside the write.
        let guarded_enable =
            patch.is_available == Some(true) && patch.available_quantity.is_none();

        let mut set_parts: Vec<&str> = Vec::new();
        if patch.name.is_some() {
            set_parts.push("name = ?");
        }
        if patch.description.is_some() {
            set_parts.push("description = ?");
        }
        if patch.category.is_some() {
            set_parts.push("category = ?");
        }
        if patch.is_vegetarian.is_some() {
            set_parts.push("is_vegetarian = ?");
        }
        if patch.price_cents.is_some() {
            set_parts.push("price_cents = ?");
        }
        if patch.available_quantity.is_some() {
            set_parts.push("available_quantity = ?");
        }
        match (patch.is_available, patch.available_quantity) {
            // Explicit flag wins
            (Some(_), _) => set_parts.push("is_available = ?"),
            // Quantity patched to zero depletes the item
            (None, Some(_)) => {
                set_parts.push("is_available = CASE WHEN ? = 0 THEN 0 ELSE is_available END")
            }
            (None, None) => {}
        }
        set_parts.push("updated_at = ?");

        let sql = format!(
            "UPDATE menu_items SET {} WHERE id = ?{} RETURNING *",
            set_parts.join(", "),
            if guarded_enable {
                " AND available_quantity > 0"
            } else {
                ""
            }
        );

        // Binds must follow the textual order of the SET clauses above.
        let mut query = sqlx::query_as::<_, MenuItem>(&sql);
        if let Some(v) = patch.name {
            query = query.bind(v);
        }
        if let Some(v) = patch.description {
            query = query.bind(v);
        }
        if let Some(v) = patch.category {
            query = query.bind(v);
        }
        if let Some(v) = patch.is_vegetarian {
            query = query.bind(v);
        }
        if let Some(v) = patch.price_cents {
            query = query.bind(v);
        }
        if let Some(v) = patch.available_quantity {
            query = query.bind(v);
        }
        match (patch.is_available, patch.available_quantity) {
            (Some(v), _) => query = query.bind(v),
            (None, Some(q)) => query = query.bind(q),
            (None, None) => {}
        }
        query = query.bind(now_millis()).bind(id);

        match query.fetch_optional(&self.pool).await? {
            Some(item) => Ok(item),
            None if guarded_enable => match self.find_by_id(id).await? {
                Some(_) => Err(RepoError::Conflict(format!(
                    "Menu item {id} has zero stock and cannot be enabled"
                ))),
                None => Err(RepoError::NotFound(format!("Menu item {id}"))),
            },
            None => Err(RepoError::NotFound(format!("Menu item {id}"))),
        }
    }

    /// Guarded stock reservation: subtract `quantity` only while at least
    /// that much remains, flipping `is_available` off on depletion.
    ///
    /// Returns `false` when the guard fails (insufficient stock at write
    /// time) - the caller re-reads to report what is actually left.
    pub async fn reserve_stock(
        &self,
        conn: &mut SqliteConnection,
        item_id: i64,
        quantity: i64,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE menu_items
               SET available_quantity = available_quantity - ?,
                   is_available = CASE WHEN available_quantity = ? THEN 0 ELSE is_available END,
                   updated_at = ?
             WHERE id = ? AND available_quantity >= ?
            "#,
        )
        .bind(quantity)
        .bind(quantity)
        .bind(now_millis())
        .bind(item_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Reverse a reservation. Re-enables the item only when the restore
    /// moves the quantity off zero - a depletion-driven disable is undone,
    /// an explicit admin hide at positive stock is not.
    pub async fn restore_stock(
        &self,
        conn: &mut SqliteConnection,
        item_id: i64,
        quantity: i64,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE menu_items
               SET available_quantity = available_quantity + ?,
                   is_available = CASE WHEN available_quantity = 0 THEN 1 ELSE is_available END,
                   updated_at = ?
             WHERE id = ?
            "#,
        )
        .bind(quantity)
        .bind(now_millis())
        .bind(item_id)
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("Menu item {item_id}")));
        }
        Ok(())
    }

    /// Guarded relative adjustment; fails the guard when the result would go
    /// negative. Increments do not auto-enable a hidden item.
    pub async fn adjust_stock_delta(&self, item_id: i64, delta: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE menu_items
               SET available_quantity = available_quantity + ?,
                   is_available = CASE WHEN available_quantity + ? = 0 THEN 0 ELSE is_available END,
                   updated_at = ?
             WHERE id = ? AND available_quantity + ? >= 0
            "#,
        )
        .bind(delta)
        .bind(delta)
        .bind(now_millis())
        .bind(item_id)
        .bind(delta)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Absolute stock replacement (non-negative, validated by the caller).
    pub async fn set_stock_absolute(&self, item_id: i64, quantity: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE menu_items
               SET available_quantity = ?,
                   is_available = CASE WHEN ? = 0 THEN 0 ELSE is_available END,
                   updated_at = ?
             WHERE id = ?
            "#,
        )
        .bind(quantity)
        .bind(quantity)
        .bind(now_millis())
        .bind(item_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Explicit show/hide. The enable write carries its own stock guard:
    /// check and flip happen in one statement, so a checkout that empties
    /// the row concurrently can never leave a visible item with nothing to
    /// sell. A failed guard is a conflict, not a silent no-op.
    pub async fn set_availability(&self, item_id: i64, value: bool) -> RepoResult<MenuItem> {
        let sql = if value {
            "UPDATE menu_items SET is_available = 1, updated_at = ? \
              WHERE id = ? AND available_quantity > 0 RETURNING *"
        } else {
            "UPDATE menu_items SET is_available = 0, updated_at = ? WHERE id = ? RETURNING *"
        };
        let updated = sqlx::query_as::<_, MenuItem>(sql)
            .bind(now_millis())
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;
        match updated {
            Some(item) => Ok(item),
            None if value => match self.find_by_id(item_id).await? {
                Some(_) => Err(RepoError::Conflict(format!(
                    "Menu item {item_id} has zero stock and cannot be enabled"
                ))),
                None => Err(RepoError::NotFound(format!("Menu item {item_id}"))),
            },
            None => Err(RepoError::NotFound(format!("Menu item {item_id}"))),
        }
    }

    /// Soft removal - historical order lines keep referencing the row.
    pub async fn soft_remove(&self, item_id: i64) -> RepoResult<MenuItem> {
        sqlx::query_as::<_, MenuItem>(
            "UPDATE menu_items SET is_available = 0, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(now_millis())
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Menu item {item_id}")))
    }
}
