//! Order errors

use shared::order::OrderStatus;

use crate::db::repository::RepoError;
use crate::utils::AppError;

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart contains items from more than one canteen")]
    MixedCanteen,

    #[error("Insufficient stock for '{name}': {available} available, {requested} requested")]
    InsufficientStock {
        item_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    #[error("Item '{name}' is not available for ordering")]
    ItemUnavailable { item_id: i64, name: String },

    #[error("Invalid pickup time: {0}")]
    InvalidPickupTime(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order cannot be cancelled: {0}")]
    CancellationNotAllowed(String),

    #[error("Status changed concurrently, current status is {current}")]
    ConcurrentTransition { current: OrderStatus },

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyCart
            | OrderError::MixedCanteen
            | OrderError::InvalidPickupTime(_)
            | OrderError::Validation(_) => AppError::validation(err.to_string()),
            OrderError::InsufficientStock { .. } | OrderError::ConcurrentTransition { .. } => {
                AppError::conflict(err.to_string())
            }
            OrderError::ItemUnavailable { .. }
            | OrderError::InvalidTransition { .. }
            | OrderError::CancellationNotAllowed(_) => AppError::business_rule(err.to_string()),
            OrderError::Forbidden(msg) => AppError::forbidden(msg),
            OrderError::NotFound(what) => AppError::not_found(what),
            OrderError::Repo(e) => e.into(),
        }
    }
}
