//! Canteen API module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/canteens", get(handler::list))
        .route("/api/canteens/{canteen_id}", get(handler::get_by_id))
}
