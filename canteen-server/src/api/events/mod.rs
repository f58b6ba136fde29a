//! Canteen event stream module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/api/canteens/{canteen_id}/events/ws",
        get(handler::handle_events_ws),
    )
}
