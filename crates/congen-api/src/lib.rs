//! Congen API Library
//!
//! HTTP handlers, caller authentication, and application setup for the
//! content generation gateway.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;

pub use error::HttpAppError;
pub use state::AppState;
