//! Order service tests - checkout atomicity, the status state machine and
//! cancellation, against a real SQLite database in a temp directory.

use std::sync::Arc;

use sqlx::SqlitePool;
use tempfile::TempDir;

use shared::events::MenuEvent;
use shared::models::MenuItemCreate;
use shared::order::{ActorRole, OrderStatus, PaymentStatus};
use shared::util::now_millis;

use crate::core::Config;
use crate::db::DbService;
use crate::db::repository::{CartRepository, MenuItemRepository};
use crate::live::CanteenHub;

use super::{CreateOrderInput, OrderError, OrderService};

const CANTEEN: i64 = 1;

struct TestContext {
    _dir: TempDir,
    pool: SqlitePool,
    hub: Arc<CanteenHub>,
    service: OrderService,
    items: MenuItemRepository,
    carts: CartRepository,
}

async fn setup() -> TestContext {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("test.db");
    let db = DbService::new(db_path.to_str().unwrap()).await.unwrap();
    let pool = db.pool;

    sqlx::query("INSERT INTO canteens (id, name, location) VALUES (?, 'North Mess', 'Block A')")
        .bind(CANTEEN)
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO canteens (id, name, location) VALUES (2, 'South Mess', 'Block B')")
        .execute(&pool)
        .await
        .unwrap();

    let hub = Arc::new(CanteenHub::new());
    let config = Config::default();
    TestContext {
        service: OrderService::new(pool.clone(), hub.clone(), config),
        items: MenuItemRepository::new(pool.clone()),
        carts: CartRepository::new(pool.clone()),
        pool,
        hub,
        _dir: dir,
    }
}

impl TestContext {
    async fn add_item(&self, canteen_id: i64, name: &str, price_cents: i64, quantity: i64) -> i64 {
        let item = self
            .items
            .create(MenuItemCreate {
                canteen_id,
                name: name.to_string(),
                description: None,
                category: Some("meals".to_string()),
                is_vegetarian: Some(true),
                price_cents,
                available_quantity: Some(quantity),
            })
            .await
            .unwrap();
        item.id
    }

    async fn fill_cart(&self, user_id: i64, item_id: i64, quantity: i64) {
        self.carts.add_line(user_id, item_id, quantity).await.unwrap();
    }

    async fn quantity_of(&self, item_id: i64) -> i64 {
        self.items
            .find_by_id(item_id)
            .await
            .unwrap()
            .unwrap()
            .available_quantity
    }

    async fn checkout(&self, user_id: i64) -> Result<shared::models::OrderWithLines, OrderError> {
        self.service
            .create_order(CreateOrderInput {
                user_id,
                pickup_time: valid_pickup(),
                special_instructions: None,
            })
            .await
    }
}

fn valid_pickup() -> i64 {
    now_millis() + 3_600_000 // one hour out
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<MenuEvent>) -> Vec<MenuEvent> {
    let mut events = Vec::new();
    while let Ok(e) = rx.try_recv() {
        events.push(e);
    }
    events
}

// ========== Checkout ==========

#[tokio::test]
async fn checkout_creates_order_and_decrements_stock() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    ctx.fill_cart(7, item_id, 2).await;

    let result = ctx.checkout(7).await.unwrap();

    assert_eq!(result.order.canteen_id, CANTEEN);
    assert_eq!(result.order.subtotal_cents, 4000);
    assert_eq!(result.order.tax_cents, 200); // 5% of 40.00
    assert_eq!(result.order.total_cents, 4200);
    assert_eq!(result.order.order_status, OrderStatus::Pending);
    assert_eq!(result.order.payment_status, PaymentStatus::Pending);

    assert_eq!(result.lines.len(), 1);
    assert_eq!(result.lines[0].seq, 1);
    assert_eq!(result.lines[0].item_name, "Veg Thali");
    assert_eq!(result.lines[0].unit_price_cents, 2000);
    assert_eq!(result.lines[0].line_total_cents, 4000);

    assert_eq!(ctx.quantity_of(item_id).await, 8);
    assert_eq!(ctx.carts.line_count(7).await.unwrap(), 0);

    // Round-trips through the store
    let fetched = ctx.service.get_order(result.order.id).await.unwrap();
    assert_eq!(fetched, result);
}

#[tokio::test]
async fn tax_rounds_half_away_from_zero() {
    let ctx = setup().await;
    // subtotal 10.50 -> tax 0.525 -> 53 cents
    let item_id = ctx.add_item(CANTEEN, "Filter Coffee", 1050, 5).await;
    ctx.fill_cart(7, item_id, 1).await;

    let result = ctx.checkout(7).await.unwrap();
    assert_eq!(result.order.tax_cents, 53);
    assert_eq!(result.order.total_cents, 1103);
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let ctx = setup().await;
    let err = ctx.checkout(7).await.unwrap_err();
    assert!(matches!(err, OrderError::EmptyCart));
}

#[tokio::test]
async fn mixed_canteen_cart_is_rejected_without_side_effects() {
    let ctx = setup().await;
    let north = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    let south = ctx.add_item(2, "Masala Dosa", 1500, 10).await;
    ctx.fill_cart(7, north, 1).await;
    ctx.fill_cart(7, south, 1).await;

    let err = ctx.checkout(7).await.unwrap_err();
    assert!(matches!(err, OrderError::MixedCanteen));

    // Nothing reserved, cart intact
    assert_eq!(ctx.quantity_of(north).await, 10);
    assert_eq!(ctx.quantity_of(south).await, 10);
    assert_eq!(ctx.carts.line_count(7).await.unwrap(), 2);
}

#[tokio::test]
async fn insufficient_stock_rolls_the_whole_checkout_back() {
    let ctx = setup().await;
    let plenty = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    let scarce = ctx.add_item(CANTEEN, "Paneer Roll", 1200, 1).await;
    ctx.fill_cart(7, plenty, 2).await;
    ctx.fill_cart(7, scarce, 3).await;

    let err = ctx.checkout(7).await.unwrap_err();
    match err {
        OrderError::InsufficientStock {
            item_id,
            available,
            requested,
            ..
        } => {
            assert_eq!(item_id, scarce);
            assert_eq!(available, 1);
            assert_eq!(requested, 3);
        }
        other => panic!("Expected InsufficientStock, got {other:?}"),
    }

    // The successful sibling reservation was rolled back too
    assert_eq!(ctx.quantity_of(plenty).await, 10);
    assert_eq!(ctx.quantity_of(scarce).await, 1);
    assert_eq!(ctx.carts.line_count(7).await.unwrap(), 2);

    let (orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
}

#[tokio::test]
async fn hidden_item_cannot_be_ordered() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    ctx.items.set_availability(item_id, false).await.unwrap();
    ctx.fill_cart(7, item_id, 1).await;

    let err = ctx.checkout(7).await.unwrap_err();
    assert!(matches!(err, OrderError::ItemUnavailable { .. }));
    assert_eq!(ctx.quantity_of(item_id).await, 10);
}

#[tokio::test]
async fn concurrent_checkouts_never_oversell() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Paneer Roll", 1200, 3).await;
    ctx.fill_cart(7, item_id, 2).await;
    ctx.fill_cart(8, item_id, 2).await;

    let (a, b) = tokio::join!(ctx.checkout(7), ctx.checkout(8));

    let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of two competing checkouts wins");
    let failure = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(failure, OrderError::InsufficientStock { available: 1, .. }));

    assert_eq!(ctx.quantity_of(item_id).await, 1);
}

#[tokio::test]
async fn last_unit_goes_to_exactly_one_customer() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Gulab Jamun", 500, 1).await;
    ctx.fill_cart(7, item_id, 1).await;
    ctx.fill_cart(8, item_id, 1).await;

    let (a, b) = tokio::join!(ctx.checkout(7), ctx.checkout(8));
    assert_eq!([&a, &b].iter().filter(|r| r.is_ok()).count(), 1);

    let item = ctx.items.find_by_id(item_id).await.unwrap().unwrap();
    assert_eq!(item.available_quantity, 0);
    assert!(!item.is_available);
}

#[tokio::test]
async fn depletion_broadcasts_update_and_availability_change() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 2).await;
    ctx.fill_cart(7, item_id, 2).await;
    let mut rx = ctx.hub.subscribe(CANTEEN);

    ctx.checkout(7).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(
        |e| matches!(e, MenuEvent::MenuItemUpdated(d) if d.item_id == item_id && d.available_quantity == 0)
    ));
    assert!(events.iter().any(
        |e| matches!(e, MenuEvent::MenuAvailabilityChanged(c) if c.item_id == item_id && !c.is_available)
    ));
}

#[tokio::test]
async fn crossing_the_low_stock_threshold_broadcasts_an_alert() {
    let ctx = setup().await;
    // Default threshold is 5; 6 -> 5 crosses the edge
    let item_id = ctx.add_item(CANTEEN, "Samosa", 300, 6).await;
    ctx.fill_cart(7, item_id, 1).await;
    let mut rx = ctx.hub.subscribe(CANTEEN);

    ctx.checkout(7).await.unwrap();

    let events = drain(&mut rx);
    assert!(events.iter().any(
        |e| matches!(e, MenuEvent::LowStockAlert(a) if a.item_id == item_id && a.available_quantity == 5)
    ));
}

#[tokio::test]
async fn pickup_time_outside_the_window_is_rejected() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    ctx.fill_cart(7, item_id, 1).await;

    // Too soon (lead is 15 minutes)
    let err = ctx
        .service
        .create_order(CreateOrderInput {
            user_id: 7,
            pickup_time: now_millis() + 5 * 60 * 1000,
            special_instructions: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidPickupTime(_)));

    // Too far (horizon is 168 hours)
    let err = ctx
        .service
        .create_order(CreateOrderInput {
            user_id: 7,
            pickup_time: now_millis() + 200 * 3_600_000,
            special_instructions: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidPickupTime(_)));

    assert_eq!(ctx.quantity_of(item_id).await, 10);
}

// ========== Status transitions ==========

#[tokio::test]
async fn staff_drive_the_full_forward_path() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    ctx.fill_cart(7, item_id, 1).await;
    let order_id = ctx.checkout(7).await.unwrap().order.id;

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
    ] {
        let order = ctx
            .service
            .transition_status(order_id, status, ActorRole::Staff)
            .await
            .unwrap();
        assert_eq!(order.order_status, status);
    }

    // Terminal: nothing more is accepted
    let err = ctx
        .service
        .transition_status(order_id, OrderStatus::Cancelled, ActorRole::Staff)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[tokio::test]
async fn skipping_ahead_is_rejected_and_leaves_the_order_unchanged() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    ctx.fill_cart(7, item_id, 1).await;
    let order_id = ctx.checkout(7).await.unwrap().order.id;

    let err = ctx
        .service
        .transition_status(order_id, OrderStatus::Ready, ActorRole::Staff)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Ready
        }
    ));

    let order = ctx.service.get_order(order_id).await.unwrap().order;
    assert_eq!(order.order_status, OrderStatus::Pending);
}

#[tokio::test]
async fn same_status_request_is_rejected() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    ctx.fill_cart(7, item_id, 1).await;
    let order_id = ctx.checkout(7).await.unwrap().order.id;

    let err = ctx
        .service
        .transition_status(order_id, OrderStatus::Pending, ActorRole::Staff)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
}

#[tokio::test]
async fn customers_may_only_cancel() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    ctx.fill_cart(7, item_id, 1).await;
    let order_id = ctx.checkout(7).await.unwrap().order.id;

    let err = ctx
        .service
        .transition_status(order_id, OrderStatus::Confirmed, ActorRole::Customer)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Forbidden(_)));

    let order = ctx
        .service
        .transition_status(order_id, OrderStatus::Cancelled, ActorRole::Customer)
        .await
        .unwrap();
    assert_eq!(order.order_status, OrderStatus::Cancelled);
}

// ========== Cancellation ==========

#[tokio::test]
async fn cancellation_restores_stock_and_reenables_depleted_items() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 2).await;
    ctx.fill_cart(7, item_id, 2).await;
    let order_id = ctx.checkout(7).await.unwrap().order.id;

    let depleted = ctx.items.find_by_id(item_id).await.unwrap().unwrap();
    assert_eq!(depleted.available_quantity, 0);
    assert!(!depleted.is_available);

    let mut rx = ctx.hub.subscribe(CANTEEN);
    ctx.service
        .transition_status(order_id, OrderStatus::Cancelled, ActorRole::Customer)
        .await
        .unwrap();

    let restored = ctx.items.find_by_id(item_id).await.unwrap().unwrap();
    assert_eq!(restored.available_quantity, 2);
    assert!(restored.is_available);

    let events = drain(&mut rx);
    assert!(events.iter().any(
        |e| matches!(e, MenuEvent::MenuItemUpdated(d) if d.available_quantity == 2)
    ));
    assert!(events.iter().any(
        |e| matches!(e, MenuEvent::MenuAvailabilityChanged(c) if c.is_available)
    ));
}

#[tokio::test]
async fn cancellation_restores_every_line_of_a_multi_line_order() {
    let ctx = setup().await;
    let thali = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    let roll = ctx.add_item(CANTEEN, "Paneer Roll", 1200, 8).await;
    ctx.fill_cart(7, thali, 5).await;
    ctx.fill_cart(7, roll, 3).await;

    let created = ctx.checkout(7).await.unwrap();
    assert_eq!(created.lines.len(), 2);
    assert_eq!(ctx.quantity_of(thali).await, 5);
    assert_eq!(ctx.quantity_of(roll).await, 5);

    let mut rx = ctx.hub.subscribe(CANTEEN);
    ctx.service
        .transition_status(created.order.id, OrderStatus::Cancelled, ActorRole::Customer)
        .await
        .unwrap();

    assert_eq!(ctx.quantity_of(thali).await, 10);
    assert_eq!(ctx.quantity_of(roll).await, 8);

    // One stock delta per restored line, nothing else
    let deltas: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            MenuEvent::MenuItemUpdated(d) => Some((d.item_id, d.available_quantity)),
            _ => None,
        })
        .collect();
    assert_eq!(deltas.len(), 2);
    assert!(deltas.contains(&(thali, 10)));
    assert!(deltas.contains(&(roll, 8)));
}

#[tokio::test]
async fn cancellation_does_not_reenable_staff_hidden_items() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    ctx.fill_cart(7, item_id, 1).await;
    let order_id = ctx.checkout(7).await.unwrap().order.id;

    // Staff hide the item while stock remains
    ctx.items.set_availability(item_id, false).await.unwrap();

    ctx.service
        .transition_status(order_id, OrderStatus::Cancelled, ActorRole::Customer)
        .await
        .unwrap();

    let item = ctx.items.find_by_id(item_id).await.unwrap().unwrap();
    assert_eq!(item.available_quantity, 10);
    assert!(!item.is_available, "explicit hide must survive a restore");
}

#[tokio::test]
async fn paid_order_in_preparation_cannot_be_cancelled() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    ctx.fill_cart(7, item_id, 1).await;
    let order_id = ctx.checkout(7).await.unwrap().order.id;

    ctx.service
        .transition_status(order_id, OrderStatus::Confirmed, ActorRole::Staff)
        .await
        .unwrap();
    ctx.service
        .transition_status(order_id, OrderStatus::Preparing, ActorRole::Staff)
        .await
        .unwrap();
    sqlx::query("UPDATE orders SET payment_status = 'paid' WHERE id = ?")
        .bind(order_id)
        .execute(&ctx.pool)
        .await
        .unwrap();

    let err = ctx
        .service
        .transition_status(order_id, OrderStatus::Cancelled, ActorRole::Customer)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::CancellationNotAllowed(_)));
    assert_eq!(ctx.quantity_of(item_id).await, 9);
}

#[tokio::test]
async fn unpaid_order_in_preparation_can_still_be_cancelled() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    ctx.fill_cart(7, item_id, 1).await;
    let order_id = ctx.checkout(7).await.unwrap().order.id;

    ctx.service
        .transition_status(order_id, OrderStatus::Confirmed, ActorRole::Staff)
        .await
        .unwrap();
    ctx.service
        .transition_status(order_id, OrderStatus::Preparing, ActorRole::Staff)
        .await
        .unwrap();

    let order = ctx
        .service
        .transition_status(order_id, OrderStatus::Cancelled, ActorRole::Staff)
        .await
        .unwrap();
    assert_eq!(order.order_status, OrderStatus::Cancelled);
    assert_eq!(ctx.quantity_of(item_id).await, 10);
}

#[tokio::test]
async fn ready_orders_cannot_be_cancelled() {
    let ctx = setup().await;
    let item_id = ctx.add_item(CANTEEN, "Veg Thali", 2000, 10).await;
    ctx.fill_cart(7, item_id, 1).await;
    let order_id = ctx.checkout(7).await.unwrap().order.id;

    for status in [OrderStatus::Confirmed, OrderStatus::Preparing, OrderStatus::Ready] {
        ctx.service
            .transition_status(order_id, status, ActorRole::Staff)
            .await
            .unwrap();
    }

    let err = ctx
        .service
        .transition_status(order_id, OrderStatus::Cancelled, ActorRole::Staff)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Ready,
            to: OrderStatus::Cancelled
        }
    ));
}

#[tokio::test]
async fn unknown_order_reports_not_found() {
    let ctx = setup().await;
    let err = ctx.service.get_order(424242).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));
}
