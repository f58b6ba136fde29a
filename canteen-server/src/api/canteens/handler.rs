//! Canteen API handlers

use axum::{
    Json,
    extract::{Path, State},
};

use shared::models::Canteen;

use crate::core::ServerState;
use crate::db::repository::CanteenRepository;
use crate::utils::{AppResponse, AppResult, ok};

/// GET /api/canteens
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<AppResponse<Vec<Canteen>>>> {
    let canteens = CanteenRepository::new(state.pool.clone()).find_all().await?;
    Ok(ok(canteens))
}

/// GET /api/canteens/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<Canteen>>> {
    let canteen = CanteenRepository::new(state.pool.clone()).get(id).await?;
    Ok(ok(canteen))
}
