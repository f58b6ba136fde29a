//! Order API handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use shared::models::{Order, OrderWithLines};
use shared::order::{ActorRole, OrderStatus};

use crate::core::ServerState;
use crate::orders::{CreateOrderInput, OrderService};
use crate::utils::{AppResponse, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: i64,
    /// Requested pickup time, millis since epoch
    pub pickup_time: i64,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: OrderStatus,
    pub actor: ActorRole,
}

fn service(state: &ServerState) -> OrderService {
    OrderService::new(state.pool.clone(), state.hub.clone(), state.config.clone())
}

/// POST /api/orders - checkout the user's cart
pub async fn create(
    State(state): State<ServerState>,
    Json(req): Json<CreateOrderRequest>,
) -> AppResult<Json<AppResponse<OrderWithLines>>> {
    let order = service(&state)
        .create_order(CreateOrderInput {
            user_id: req.user_id,
            pickup_time: req.pickup_time,
            special_instructions: req.special_instructions,
        })
        .await?;
    Ok(ok(order))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<AppResponse<OrderWithLines>>> {
    let order = service(&state).get_order(id).await?;
    Ok(ok(order))
}

/// POST /api/orders/{id}/status - request a status transition
pub async fn change_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(req): Json<StatusChangeRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = service(&state)
        .transition_status(id, req.status, req.actor)
        .await?;
    Ok(ok(order))
}
