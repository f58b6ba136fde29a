//! Inventory administration
//!
//! Menu item CRUD and stock writes for canteen staff. Every mutation that
//! changes quantity or availability broadcasts the committed state on the
//! item's canteen channel.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::info;

use shared::events::MenuEvent;
use shared::models::{
    BulkStockEntry, BulkStockOutcome, MenuItem, MenuItemCreate, MenuItemPatch, StockAdjustment,
};
use shared::util::now_millis;

use crate::core::Config;
use crate::db::repository::MenuItemRepository;
use crate::live::{CanteenHub, notify::publish_stock_change};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_price_cents,
    validate_required_text,
};
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct InventoryService {
    hub: Arc<CanteenHub>,
    config: Config,
    items: MenuItemRepository,
}

impl InventoryService {
    pub fn new(pool: SqlitePool, hub: Arc<CanteenHub>, config: Config) -> Self {
        Self {
            items: MenuItemRepository::new(pool),
            hub,
            config,
        }
    }

    pub async fn get_item(&self, item_id: i64) -> AppResult<MenuItem> {
        self.items
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Menu item {item_id}")))
    }

    pub async fn list_by_canteen(&self, canteen_id: i64) -> AppResult<Vec<MenuItem>> {
        Ok(self.items.find_by_canteen(canteen_id).await?)
    }

    pub async fn create_item(&self, data: MenuItemCreate) -> AppResult<MenuItem> {
        validate_required_text(&data.name, "name", MAX_NAME_LEN).map_err(AppError::validation)?;
        validate_optional_text(data.description.as_deref(), "description", MAX_NOTE_LEN)
            .map_err(AppError::validation)?;
        validate_price_cents(data.price_cents).map_err(AppError::validation)?;
        if data.available_quantity.is_some_and(|q| q < 0) {
            return Err(AppError::validation("initial quantity cannot be negative"));
        }

        let item = self.items.create(data).await?;
        info!(item_id = item.id, canteen_id = item.canteen_id, "Menu item created");
        self.hub.publish(MenuEvent::MenuItemAdded(item.clone()));
        Ok(item)
    }

    pub async fn patch_item(&self, item_id: i64, patch: MenuItemPatch) -> AppResult<MenuItem> {
        if let Some(name) = patch.name.as_deref() {
            validate_required_text(name, "name", MAX_NAME_LEN).map_err(AppError::validation)?;
        }
        validate_optional_text(patch.description.as_deref(), "description", MAX_NOTE_LEN)
            .map_err(AppError::validation)?;
        if let Some(price) = patch.price_cents {
            validate_price_cents(price).map_err(AppError::validation)?;
        }
        if patch.available_quantity.is_some_and(|q| q < 0) {
            return Err(AppError::validation("quantity cannot be negative"));
        }

        let before = self.get_item(item_id).await?;
        // An item cannot be shown while it has nothing to sell
        let quantity_after = patch.available_quantity.unwrap_or(before.available_quantity);
        if patch.is_available == Some(true) && quantity_after == 0 {
            return Err(AppError::business_rule(
                "cannot enable an item with zero stock",
            ));
        }

        let after = self.items.apply_patch(item_id, patch).await?;
        publish_stock_change(&self.hub, self.config.low_stock_threshold, &before, &after);
        Ok(after)
    }

    /// Apply a single stock adjustment, relative or absolute. The relative
    /// form fails when the result would go negative; neither form re-enables
    /// an item a staff member explicitly hid.
    pub async fn adjust_stock(
        &self,
        item_id: i64,
        adjustment: StockAdjustment,
    ) -> AppResult<MenuItem> {
        let before = self.get_item(item_id).await?;

        let applied = match adjustment {
            StockAdjustment::Delta(delta) => self.items.adjust_stock_delta(item_id, delta).await?,
            StockAdjustment::Absolute(quantity) => {
                if quantity < 0 {
                    return Err(AppError::validation("quantity cannot be negative"));
                }
                self.items.set_stock_absolute(item_id, quantity).await?
            }
        };
        if !applied {
            return Err(AppError::conflict(format!(
                "stock adjustment rejected, {} available",
                before.available_quantity
            )));
        }

        let after = self.get_item(item_id).await?;
        info!(
            item_id,
            before = before.available_quantity,
            after = after.available_quantity,
            "Stock adjusted"
        );
        publish_stock_change(&self.hub, self.config.low_stock_threshold, &before, &after);
        Ok(after)
    }

    /// Administrator bulk update. Items are adjusted independently; one
    /// failure never rolls back its siblings, and the response reports each
    /// outcome.
    pub async fn bulk_adjust(&self, entries: Vec<BulkStockEntry>) -> AppResult<Vec<BulkStockOutcome>> {
        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            let outcome = match self.adjust_stock(entry.item_id, entry.adjustment).await {
                Ok(item) => BulkStockOutcome {
                    item_id: entry.item_id,
                    success: true,
                    available_quantity: Some(item.available_quantity),
                    error: None,
                },
                Err(err) => BulkStockOutcome {
                    item_id: entry.item_id,
                    success: false,
                    available_quantity: None,
                    error: Some(err.to_string()),
                },
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Explicit show/hide. Enabling an item with zero stock is rejected;
    /// restock it first.
    pub async fn set_availability(&self, item_id: i64, value: bool) -> AppResult<MenuItem> {
        let before = self.get_item(item_id).await?;
        if value && before.available_quantity == 0 {
            return Err(AppError::business_rule(
                "cannot enable an item with zero stock",
            ));
        }

        let after = self.items.set_availability(item_id, value).await?;
        publish_stock_change(&self.hub, self.config.low_stock_threshold, &before, &after);
        Ok(after)
    }

    /// Soft removal: the row stays for historical order lines, the item
    /// disappears from ordering and the canteen is told to drop it.
    pub async fn remove_item(&self, item_id: i64) -> AppResult<MenuItem> {
        let item = self.items.soft_remove(item_id).await?;
        info!(item_id, canteen_id = item.canteen_id, "Menu item removed");
        self.hub.publish(MenuEvent::MenuItemRemoved {
            canteen_id: item.canteen_id,
            item_id: item.id,
            timestamp: now_millis(),
        });
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::db::DbService;

    struct TestContext {
        _dir: TempDir,
        hub: Arc<CanteenHub>,
        service: InventoryService,
    }

    async fn setup() -> TestContext {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("test.db");
        let db = DbService::new(db_path.to_str().unwrap()).await.unwrap();

        sqlx::query("INSERT INTO canteens (id, name, location) VALUES (1, 'North Mess', 'Block A')")
            .execute(&db.pool)
            .await
            .unwrap();

        let hub = Arc::new(CanteenHub::new());
        TestContext {
            service: InventoryService::new(db.pool.clone(), hub.clone(), Config::default()),
            hub,
            _dir: dir,
        }
    }

    fn new_item(name: &str, quantity: i64) -> MenuItemCreate {
        MenuItemCreate {
            canteen_id: 1,
            name: name.to_string(),
            description: None,
            category: Some("snacks".to_string()),
            is_vegetarian: Some(true),
            price_cents: 500,
            available_quantity: Some(quantity),
        }
    }

    #[tokio::test]
    async fn created_item_with_zero_stock_starts_hidden() {
        let ctx = setup().await;
        let item = ctx.service.create_item(new_item("Samosa", 0)).await.unwrap();
        assert_eq!(item.available_quantity, 0);
        assert!(!item.is_available);

        let stocked = ctx.service.create_item(new_item("Kachori", 4)).await.unwrap();
        assert!(stocked.is_available);
    }

    #[tokio::test]
    async fn create_broadcasts_menu_item_added() {
        let ctx = setup().await;
        let mut rx = ctx.hub.subscribe(1);
        let item = ctx.service.create_item(new_item("Samosa", 3)).await.unwrap();
        match rx.try_recv().unwrap() {
            MenuEvent::MenuItemAdded(added) => assert_eq!(added.id, item.id),
            other => panic!("Expected MenuItemAdded, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delta_and_absolute_adjustments() {
        let ctx = setup().await;
        let item = ctx.service.create_item(new_item("Samosa", 10)).await.unwrap();

        let after = ctx
            .service
            .adjust_stock(item.id, StockAdjustment::Delta(-3))
            .await
            .unwrap();
        assert_eq!(after.available_quantity, 7);

        let after = ctx
            .service
            .adjust_stock(item.id, StockAdjustment::Absolute(20))
            .await
            .unwrap();
        assert_eq!(after.available_quantity, 20);
    }

    #[tokio::test]
    async fn delta_below_zero_is_rejected() {
        let ctx = setup().await;
        let item = ctx.service.create_item(new_item("Samosa", 2)).await.unwrap();

        let err = ctx
            .service
            .adjust_stock(item.id, StockAdjustment::Delta(-5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let unchanged = ctx.service.get_item(item.id).await.unwrap();
        assert_eq!(unchanged.available_quantity, 2);
    }

    #[tokio::test]
    async fn setting_stock_to_zero_hides_the_item() {
        let ctx = setup().await;
        let item = ctx.service.create_item(new_item("Samosa", 5)).await.unwrap();

        let after = ctx
            .service
            .adjust_stock(item.id, StockAdjustment::Absolute(0))
            .await
            .unwrap();
        assert_eq!(after.available_quantity, 0);
        assert!(!after.is_available);
    }

    #[tokio::test]
    async fn restock_does_not_reenable_a_hidden_item() {
        let ctx = setup().await;
        let item = ctx.service.create_item(new_item("Samosa", 5)).await.unwrap();
        ctx.service.set_availability(item.id, false).await.unwrap();

        let after = ctx
            .service
            .adjust_stock(item.id, StockAdjustment::Delta(10))
            .await
            .unwrap();
        assert_eq!(after.available_quantity, 15);
        assert!(!after.is_available, "explicit hide requires an explicit show");

        let shown = ctx.service.set_availability(item.id, true).await.unwrap();
        assert!(shown.is_available);
    }

    #[tokio::test]
    async fn enabling_an_item_with_zero_stock_is_rejected() {
        let ctx = setup().await;
        let item = ctx.service.create_item(new_item("Samosa", 0)).await.unwrap();

        let err = ctx.service.set_availability(item.id, true).await.unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));

        ctx.service
            .adjust_stock(item.id, StockAdjustment::Absolute(3))
            .await
            .unwrap();
        // Absolute restock off zero leaves the item hidden until shown
        let shown = ctx.service.set_availability(item.id, true).await.unwrap();
        assert!(shown.is_available);
    }

    #[tokio::test]
    async fn bulk_update_applies_items_independently() {
        let ctx = setup().await;
        let a = ctx.service.create_item(new_item("Samosa", 10)).await.unwrap();
        let b = ctx.service.create_item(new_item("Kachori", 2)).await.unwrap();
        let c = ctx.service.create_item(new_item("Jalebi", 5)).await.unwrap();

        let outcomes = ctx
            .service
            .bulk_adjust(vec![
                BulkStockEntry { item_id: a.id, adjustment: StockAdjustment::Delta(-4) },
                BulkStockEntry { item_id: b.id, adjustment: StockAdjustment::Delta(-9) },
                BulkStockEntry { item_id: 999, adjustment: StockAdjustment::Absolute(1) },
                BulkStockEntry { item_id: c.id, adjustment: StockAdjustment::Absolute(8) },
            ])
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[0].success);
        assert_eq!(outcomes[0].available_quantity, Some(6));
        assert!(!outcomes[1].success, "underflow entry must fail alone");
        assert!(!outcomes[2].success, "unknown item must fail alone");
        assert!(outcomes[3].success);
        assert_eq!(outcomes[3].available_quantity, Some(8));

        // Failures did not roll back sibling successes
        assert_eq!(ctx.service.get_item(a.id).await.unwrap().available_quantity, 6);
        assert_eq!(ctx.service.get_item(b.id).await.unwrap().available_quantity, 2);
        assert_eq!(ctx.service.get_item(c.id).await.unwrap().available_quantity, 8);
    }

    #[tokio::test]
    async fn patch_updates_fields_and_zero_quantity_hides() {
        let ctx = setup().await;
        let item = ctx.service.create_item(new_item("Samosa", 5)).await.unwrap();

        let patched = ctx
            .service
            .patch_item(
                item.id,
                MenuItemPatch {
                    name: Some("Punjabi Samosa".to_string()),
                    price_cents: Some(600),
                    available_quantity: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.name, "Punjabi Samosa");
        assert_eq!(patched.price_cents, 600);
        assert_eq!(patched.available_quantity, 0);
        assert!(!patched.is_available);
    }

    #[tokio::test]
    async fn patch_cannot_enable_with_zero_stock() {
        let ctx = setup().await;
        let item = ctx.service.create_item(new_item("Samosa", 0)).await.unwrap();

        let err = ctx
            .service
            .patch_item(
                item.id,
                MenuItemPatch { is_available: Some(true), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }

    #[tokio::test]
    async fn removal_is_soft_and_broadcast() {
        let ctx = setup().await;
        let item = ctx.service.create_item(new_item("Samosa", 5)).await.unwrap();
        let mut rx = ctx.hub.subscribe(1);

        ctx.service.remove_item(item.id).await.unwrap();

        // Row survives for historical order lines, hidden from ordering
        let removed = ctx.service.get_item(item.id).await.unwrap();
        assert!(!removed.is_available);

        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert!(events.iter().any(|e| matches!(
            e,
            MenuEvent::MenuItemRemoved { item_id, .. } if *item_id == item.id
        )));
    }

    #[tokio::test]
    async fn validation_rejects_bad_creates() {
        let ctx = setup().await;

        let mut blank = new_item("  ", 5);
        blank.name = "   ".to_string();
        assert!(matches!(
            ctx.service.create_item(blank).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let mut negative = new_item("Samosa", 5);
        negative.price_cents = -1;
        assert!(matches!(
            ctx.service.create_item(negative).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let mut negative_stock = new_item("Samosa", 5);
        negative_stock.available_quantity = Some(-2);
        assert!(matches!(
            ctx.service.create_item(negative_stock).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
