use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::bus::{BusError, BusResult, MessageBus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub exchange: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
}

/// In-process bus that records every publish in order.
///
/// Used for local development without a broker and in tests. Publishing to an
/// undeclared exchange fails, like a real broker would.
pub struct MemoryBus {
    exchanges: Mutex<HashSet<String>>,
    messages: Mutex<Vec<PublishedMessage>>,
    connected: AtomicBool,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self {
            exchanges: Mutex::new(HashSet::new()),
            messages: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    /// Snapshot of everything published so far.
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    /// Simulate a lost broker connection.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    fn ensure_connected(&self) -> BusResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BusError::NotConnected("memory bus disconnected".to_string()))
        }
    }
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for MemoryBus {
    async fn declare_exchange(&self, exchange: &str) -> BusResult<()> {
        self.ensure_connected()?;
        self.exchanges
            .lock()
            .map_err(|_| BusError::Protocol("exchange registry poisoned".to_string()))?
            .insert(exchange.to_string());
        Ok(())
    }

    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> BusResult<()> {
        self.ensure_connected()?;

        let declared = self
            .exchanges
            .lock()
            .map_err(|_| BusError::Protocol("exchange registry poisoned".to_string()))?
            .contains(exchange);
        if !declared {
            return Err(BusError::Protocol(format!(
                "exchange {} has not been declared",
                exchange
            )));
        }

        self.messages
            .lock()
            .map_err(|_| BusError::Protocol("message log poisoned".to_string()))?
            .push(PublishedMessage {
                exchange: exchange.to_string(),
                routing_key: routing_key.to_string(),
                payload: payload.to_vec(),
            });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_requires_declared_exchange() {
        let bus = MemoryBus::new();
        let err = bus.publish("ai", "user_1", b"{}").await.unwrap_err();
        assert!(matches!(err, BusError::Protocol(_)));

        bus.declare_exchange("ai").await.unwrap();
        bus.declare_exchange("ai").await.unwrap();
        bus.publish("ai", "user_1", b"{}").await.unwrap();
        assert_eq!(bus.published().len(), 1);
    }

    #[tokio::test]
    async fn test_disconnected_bus_reports_not_connected() {
        let bus = MemoryBus::new();
        bus.declare_exchange("ai").await.unwrap();
        bus.set_connected(false);
        let err = bus.publish("ai", "user_1", b"{}").await.unwrap_err();
        assert!(matches!(err, BusError::NotConnected(_)));
    }
}
