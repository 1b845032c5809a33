//! Message bus abstraction.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("Message bus not connected: {0}")]
    NotConnected(String),

    #[error("Message rejected by broker: {0}")]
    Rejected(String),

    #[error("Publish timed out: {0}")]
    Timeout(String),

    #[error("Failed to encode message: {0}")]
    Serialization(String),

    #[error("Message bus protocol error: {0}")]
    Protocol(String),
}

pub type BusResult<T> = Result<T, BusError>;

impl From<BusError> for congen_core::AppError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::Timeout(msg) => congen_core::AppError::Timeout(msg),
            other => congen_core::AppError::Bus(other.to_string()),
        }
    }
}

/// Topic-routed message bus.
///
/// Implementations are not required to be safe for concurrent publishes; the
/// `DispatchPublisher` serializes every call onto one task.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Declare a durable topic exchange. Idempotent.
    async fn declare_exchange(&self, exchange: &str) -> BusResult<()>;

    /// Publish `payload` and wait for the broker to take responsibility for it.
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> BusResult<()>;

    fn name(&self) -> &'static str;
}
