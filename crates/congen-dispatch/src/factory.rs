use std::sync::Arc;

use congen_core::{BusBackend, BusConfig};

use crate::{AmqpBus, BusError, BusResult, MemoryBus, MessageBus};

/// Create a message bus based on configuration
pub async fn create_bus(config: &BusConfig) -> BusResult<Arc<dyn MessageBus>> {
    match config.backend {
        BusBackend::Amqp => {
            let url = config.amqp_url.as_deref().ok_or_else(|| {
                BusError::NotConnected("AMQP_URL not configured".to_string())
            })?;
            Ok(Arc::new(AmqpBus::connect(url).await?))
        }
        BusBackend::Memory => Ok(Arc::new(MemoryBus::new())),
    }
}
