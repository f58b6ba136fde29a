//! Menu item API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use shared::models::{
    BulkStockEntry, BulkStockOutcome, MenuItem, MenuItemCreate, MenuItemPatch, StockAdjustment,
};

use crate::core::ServerState;
use crate::inventory::InventoryService;
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

fn service(state: &ServerState) -> InventoryService {
    InventoryService::new(state.pool.clone(), state.hub.clone(), state.config.clone())
}

/// GET /api/canteens/{canteen_id}/menu-items
pub async fn list_by_canteen(
    State(state): State<ServerState>,
    Path(canteen_id): Path<i64>,
) -> AppResult<Json<AppResponse<Vec<MenuItem>>>> {
    let items = service(&state).list_by_canteen(canteen_id).await?;
    Ok(ok(items))
}

/// POST /api/menu-items
pub async fn create(
    State(state): State<ServerState>,
    Json(data): Json<MenuItemCreate>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    let item = service(&state).create_item(data).await?;
    Ok(ok(item))
}

/// GET /api/menu-items/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    let item = service(&state).get_item(id).await?;
    Ok(ok(item))
}

/// PATCH /api/menu-items/{id}
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(patch): Json<MenuItemPatch>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    let item = service(&state).patch_item(id, patch).await?;
    Ok(ok(item))
}

/// DELETE /api/menu-items/{id} - soft removal
pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    let item = service(&state).remove_item(id).await?;
    Ok(ok_with_message(item, "Menu item removed"))
}

/// PUT /api/menu-items/{id}/stock - relative or absolute stock write
pub async fn adjust_stock(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(adjustment): Json<StockAdjustment>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    let item = service(&state).adjust_stock(id, adjustment).await?;
    Ok(ok(item))
}

/// PUT /api/menu-items/{id}/availability - explicit show/hide
pub async fn set_availability(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(req): Json<AvailabilityRequest>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    let item = service(&state).set_availability(id, req.is_available).await?;
    Ok(ok(item))
}

/// POST /api/menu-items/bulk-stock - per-item independent outcomes
pub async fn bulk_stock(
    State(state): State<ServerState>,
    Json(entries): Json<Vec<BulkStockEntry>>,
) -> AppResult<Json<AppResponse<Vec<BulkStockOutcome>>>> {
    let outcomes = service(&state).bulk_adjust(entries).await?;
    Ok(ok(outcomes))
}
