//! Core module - server configuration, state and errors
//!
//! - [`Config`] - env-driven configuration
//! - [`ServerState`] - shared handles (pool, hub, config)
//! - [`Server`] - HTTP server
//! - [`ServerError`] - startup/runtime errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
