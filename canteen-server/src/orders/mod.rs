//! Order lifecycle
//!
//! Checkout (cart snapshot to committed order with reserved stock), the
//! validated status state machine, and cancellation with stock restoration.

pub mod error;
pub mod service;

#[cfg(test)]
mod tests;

pub use error::OrderError;
pub use service::{CreateOrderInput, OrderService};
