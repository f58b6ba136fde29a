//! API routing
//!
//! # Structure
//!
//! - [`health`] - liveness check
//! - [`canteens`] - canteen directory endpoints
//! - [`orders`] - checkout and order status endpoints
//! - [`menu_items`] - menu and stock administration endpoints
//! - [`events`] - per-canteen WebSocket event stream

pub mod canteens;
pub mod events;
pub mod health;
pub mod menu_items;
pub mod orders;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Build the full application router.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(canteens::router())
        .merge(orders::router())
        .merge(menu_items::router())
        .merge(events::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
