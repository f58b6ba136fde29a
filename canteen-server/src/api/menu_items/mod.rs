//! Menu item API module

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/menu-items", item_routes())
        .route(
            "/api/canteens/{canteen_id}/menu-items",
            get(handler::list_by_canteen),
        )
}

fn item_routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .patch(handler::update)
                .delete(handler::remove),
        )
        .route("/{id}/stock", put(handler::adjust_stock))
        .route("/{id}/availability", put(handler::set_availability))
        .route("/bulk-stock", post(handler::bulk_stock))
}
