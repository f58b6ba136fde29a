//! Order Service
//!
//! Checkout turns a cart snapshot into a committed order with reserved
//! stock, all inside one database transaction. Either every line reserves
//! and the order exists, or nothing changed. Events are published only
//! after commit, from rows read inside the committing transaction.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::SqlitePool;
use tracing::{info, warn};

use shared::models::{MenuItem, Order, OrderLine, OrderWithLines};
use shared::order::{ActorRole, OrderStatus, PaymentStatus};
use shared::util::{now_millis, snowflake_id};

use crate::core::Config;
use crate::db::repository::{CartRepository, MenuItemRepository, OrderRepository};
use crate::live::{CanteenHub, notify::publish_stock_change};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text, validate_pickup_time, validate_quantity};

use super::OrderError;

/// Checkout request.
#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub user_id: i64,
    /// Requested pickup time, millis since epoch
    pub pickup_time: i64,
    pub special_instructions: Option<String>,
}

#[derive(Clone)]
pub struct OrderService {
    pool: SqlitePool,
    hub: Arc<CanteenHub>,
    config: Config,
    items: MenuItemRepository,
    orders: OrderRepository,
    carts: CartRepository,
}

impl OrderService {
    pub fn new(pool: SqlitePool, hub: Arc<CanteenHub>, config: Config) -> Self {
        Self {
            items: MenuItemRepository::new(pool.clone()),
            orders: OrderRepository::new(pool.clone()),
            carts: CartRepository::new(pool.clone()),
            pool,
            hub,
            config,
        }
    }

    /// Checkout: snapshot the cart, reserve stock line by line with guarded
    /// updates, write the order with price-snapshotted lines, clear the
    /// cart, commit. Any failure rolls the whole transaction back.
    pub async fn create_order(&self, input: CreateOrderInput) -> Result<OrderWithLines, OrderError> {
        self.validate_input(&input)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| OrderError::Repo(e.into()))?;

        let cart = self.carts.snapshot(&mut tx, input.user_id).await?;
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let canteen_id = cart[0].canteen_id;
        if cart.iter().any(|line| line.canteen_id != canteen_id) {
            return Err(OrderError::MixedCanteen);
        }
        for line in &cart {
            validate_quantity(line.quantity, "cart line quantity").map_err(OrderError::Validation)?;
        }

        let item_ids: Vec<i64> = cart.iter().map(|l| l.item_id).collect();
        let before: HashMap<i64, MenuItem> = self
            .items
            .fetch_many(&mut tx, &item_ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        // Reserve each line. A failed guard means the stock moved under us;
        // re-read inside the transaction to report what is actually left.
        for line in &cart {
            let item = before
                .get(&line.item_id)
                .ok_or_else(|| OrderError::NotFound(format!("Menu item {}", line.item_id)))?;
            if !item.is_available {
                return Err(OrderError::ItemUnavailable {
                    item_id: item.id,
                    name: item.name.clone(),
                });
            }
            let reserved = self
                .items
                .reserve_stock(&mut tx, line.item_id, line.quantity)
                .await?;
            if !reserved {
                let current = self
                    .items
                    .fetch_many(&mut tx, &[line.item_id])
                    .await?
                    .into_iter()
                    .next()
                    .map(|i| i.available_quantity)
                    .unwrap_or(0);
                warn!(
                    item_id = line.item_id,
                    requested = line.quantity,
                    available = current,
                    "Checkout rejected, insufficient stock"
                );
                return Err(OrderError::InsufficientStock {
                    item_id: line.item_id,
                    name: item.name.clone(),
                    available: current,
                    requested: line.quantity,
                });
            }
        }

        // Price snapshot and totals. Tax rounds half away from zero to
        // whole cents.
        let mut lines = Vec::with_capacity(cart.len());
        let mut subtotal_cents: i64 = 0;
        let order_id = snowflake_id();
        for (idx, cart_line) in cart.iter().enumerate() {
            let item = &before[&cart_line.item_id];
            let line_total = item.price_cents * cart_line.quantity;
            subtotal_cents += line_total;
            lines.push(OrderLine {
                order_id,
                seq: (idx + 1) as i64,
                item_id: item.id,
                item_name: item.name.clone(),
                item_description: item.description.clone(),
                unit_price_cents: item.price_cents,
                quantity: cart_line.quantity,
                line_total_cents: line_total,
            });
        }
        let tax_cents = (Decimal::from(subtotal_cents) * self.config.tax_rate)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or_else(|| OrderError::Validation("order total overflow".to_string()))?;

        let now = now_millis();
        let order = Order {
            id: order_id,
            user_id: input.user_id,
            canteen_id,
            pickup_time: input.pickup_time,
            special_instructions: input.special_instructions.unwrap_or_default(),
            subtotal_cents,
            tax_cents,
            total_cents: subtotal_cents + tax_cents,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        self.orders.insert_with_lines(&mut tx, &order, &lines).await?;
        self.carts.clear(&mut tx, input.user_id).await?;

        // Post-reservation rows, read before commit so the published events
        // describe exactly what was committed.
        let after = self.items.fetch_many(&mut tx, &item_ids).await?;

        tx.commit().await.map_err(|e| OrderError::Repo(e.into()))?;

        info!(
            order_id,
            user_id = input.user_id,
            canteen_id,
            total_cents = order.total_cents,
            lines = lines.len(),
            "Order created"
        );

        for item in &after {
            if let Some(prev) = before.get(&item.id) {
                publish_stock_change(&self.hub, self.config.low_stock_threshold, prev, item);
            }
        }

        Ok(OrderWithLines { order, lines })
    }

    /// Request a status change on behalf of an actor. Validates the
    /// transition table and the role gate, then applies the change with a
    /// compare-and-set so a concurrent transition cannot be overwritten.
    /// Cancellation restores every line's stock in the same transaction.
    pub async fn transition_status(
        &self,
        order_id: i64,
        to: OrderStatus,
        actor: ActorRole,
    ) -> Result<Order, OrderError> {
        let order = self.orders.get(order_id).await?;
        let from = order.order_status;

        if !from.can_transition(to) {
            return Err(OrderError::InvalidTransition { from, to });
        }
        if !actor.may_request(to) {
            return Err(OrderError::Forbidden(format!(
                "role is not allowed to set status {to}"
            )));
        }
        if to == OrderStatus::Cancelled {
            // Payment state is re-checked inside the cancel transaction; a
            // confirmation landing after the read above must still block it.
            self.cancel(order_id, from).await?;
        } else {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| OrderError::Repo(e.into()))?;
            let applied = self.orders.update_status(&mut tx, order_id, from, to).await?;
            if !applied {
                let current = self.current_status_in_tx(&mut tx, order_id).await?;
                return Err(OrderError::ConcurrentTransition { current });
            }
            tx.commit().await.map_err(|e| OrderError::Repo(e.into()))?;
            info!(order_id, %from, %to, "Order status changed");
        }

        Ok(self.orders.get(order_id).await?)
    }

    /// Cancel inside one transaction: re-read the order, refuse paid orders
    /// already in preparation, flip the status with a compare-and-set and
    /// restore every line's quantity. Events go out after commit.
    async fn cancel(&self, order_id: i64, from: OrderStatus) -> Result<(), OrderError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| OrderError::Repo(e.into()))?;

        // The row as this transaction sees it, not as the caller read it.
        let order = self.orders.get_in_tx(&mut tx, order_id).await?;
        if order.order_status != from {
            return Err(OrderError::ConcurrentTransition {
                current: order.order_status,
            });
        }
        if from == OrderStatus::Preparing && order.payment_status == PaymentStatus::Paid {
            return Err(OrderError::CancellationNotAllowed(
                "paid orders already in preparation cannot be cancelled".to_string(),
            ));
        }

        let applied = self
            .orders
            .update_status(&mut tx, order_id, from, OrderStatus::Cancelled)
            .await?;
        if !applied {
            let current = self.current_status_in_tx(&mut tx, order_id).await?;
            return Err(OrderError::ConcurrentTransition { current });
        }

        let lines = self.orders.find_lines_in_tx(&mut tx, order_id).await?;
        let item_ids: Vec<i64> = lines.iter().map(|l| l.item_id).collect();
        let before: HashMap<i64, MenuItem> = self
            .items
            .fetch_many(&mut tx, &item_ids)
            .await?
            .into_iter()
            .map(|item| (item.id, item))
            .collect();

        for line in &lines {
            self.items
                .restore_stock(&mut tx, line.item_id, line.quantity)
                .await?;
        }

        let after = self.items.fetch_many(&mut tx, &item_ids).await?;
        tx.commit().await.map_err(|e| OrderError::Repo(e.into()))?;

        info!(order_id, %from, restored_lines = lines.len(), "Order cancelled, stock restored");

        for item in &after {
            if let Some(prev) = before.get(&item.id) {
                publish_stock_change(&self.hub, self.config.low_stock_threshold, prev, item);
            }
        }
        Ok(())
    }

    pub async fn get_order(&self, order_id: i64) -> Result<OrderWithLines, OrderError> {
        self.orders
            .find_with_lines(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("Order {order_id}")))
    }

    fn validate_input(&self, input: &CreateOrderInput) -> Result<(), OrderError> {
        validate_optional_text(
            input.special_instructions.as_deref(),
            "special instructions",
            MAX_NOTE_LEN,
        )
        .map_err(OrderError::Validation)?;

        let pickup = chrono::DateTime::from_timestamp_millis(input.pickup_time)
            .ok_or_else(|| OrderError::InvalidPickupTime("unparseable timestamp".to_string()))?;
        validate_pickup_time(
            pickup,
            chrono::Utc::now(),
            self.config.pickup_min_lead_minutes,
            self.config.pickup_max_horizon_hours,
        )
        .map_err(OrderError::InvalidPickupTime)?;
        Ok(())
    }

    async fn current_status_in_tx(
        &self,
        conn: &mut sqlx::SqliteConnection,
        order_id: i64,
    ) -> Result<OrderStatus, OrderError> {
        let (status,): (OrderStatus,) =
            sqlx::query_as("SELECT order_status FROM orders WHERE id = ?")
                .bind(order_id)
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| OrderError::Repo(e.into()))?;
        Ok(status)
    }
}
