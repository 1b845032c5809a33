//! Congen Core Library
//!
//! Domain models, error types and configuration shared by all Congen components.

pub mod backends;
pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use backends::{BusBackend, IdentityBackend, StorageBackend};
pub use config::{BusConfig, Config, IdentityConfig, ServerConfig, StorageConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
