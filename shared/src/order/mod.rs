//! Order status domain
//!
//! The transition table lives here, independent of storage mechanics, so the
//! server and any client can validate moves without a round trip.

pub mod status;

pub use status::{ActorRole, OrderStatus, PaymentStatus};
