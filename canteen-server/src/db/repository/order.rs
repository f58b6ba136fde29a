//! Order Repository
//!
//! Order rows and their immutable lines. Status changes are compare-and-set
//! on the previous status so a concurrent transition cannot be overwritten.

use sqlx::{SqliteConnection, SqlitePool};

use shared::models::{Order, OrderLine, OrderWithLines};
use shared::order::OrderStatus;
use shared::util::now_millis;

use super::{RepoError, RepoResult};

#[derive(Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an order and all of its lines inside the caller's transaction.
    pub async fn insert_with_lines(
        &self,
        conn: &mut SqliteConnection,
        order: &Order,
        lines: &[OrderLine],
    ) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, canteen_id, pickup_time, special_instructions,
                subtotal_cents, tax_cents, total_cents,
                payment_status, order_status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.canteen_id)
        .bind(order.pickup_time)
        .bind(&order.special_instructions)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(order.payment_status)
        .bind(order.order_status)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, seq, item_id, item_name, item_description,
                    unit_price_cents, quantity, line_total_cents
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(line.order_id)
            .bind(line.seq)
            .bind(line.item_id)
            .bind(&line.item_name)
            .bind(&line.item_description)
            .bind(line.unit_price_cents)
            .bind(line.quantity)
            .bind(line.line_total_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    pub async fn find_by_id(&self, id: i64) -> RepoResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    pub async fn find_lines(&self, order_id: i64) -> RepoResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            "SELECT * FROM order_items WHERE order_id = ? ORDER BY seq",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lines)
    }

    pub async fn find_with_lines(&self, id: i64) -> RepoResult<Option<OrderWithLines>> {
        let Some(order) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let lines = self.find_lines(id).await?;
        Ok(Some(OrderWithLines { order, lines }))
    }

    /// Lines fetched inside a transaction (cancellation restores from these).
    pub async fn find_lines_in_tx(
        &self,
        conn: &mut SqliteConnection,
        order_id: i64,
    ) -> RepoResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            "SELECT * FROM order_items WHERE order_id = ? ORDER BY seq",
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(lines)
    }

    /// Reload an order inside the caller's transaction. Cancellation checks
    /// payment state on this row, not on anything read before the
    /// transaction opened.
    pub async fn get_in_tx(&self, conn: &mut SqliteConnection, id: i64) -> RepoResult<Order> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        order.ok_or_else(|| RepoError::NotFound(format!("Order {id}")))
    }

    /// Compare-and-set status change. Returns `false` when the order is no
    /// longer in `from` (raced by another transition).
    pub async fn update_status(
        &self,
        conn: &mut SqliteConnection,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            "UPDATE orders SET order_status = ?, updated_at = ? WHERE id = ? AND order_status = ?",
        )
        .bind(to)
        .bind(now_millis())
        .bind(order_id)
        .bind(from)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Reload an order, failing when it vanished mid-operation.
    pub async fn get(&self, id: i64) -> RepoResult<Order> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {id}")))
    }
}
