//! Dispatch publisher: one owning task per bus channel.
//!
//! Every publish goes through a bounded queue into a single task that talks to the
//! bus, so publishes are never interleaved on the channel and jobs sharing a routing
//! key leave in the order they were submitted. A request that has been queued is
//! published even if its caller stops waiting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use congen_core::models::GenerationJob;

use crate::bus::{BusError, BusResult, MessageBus};

struct PublishRequest {
    routing_key: String,
    payload: Vec<u8>,
    reply: oneshot::Sender<BusResult<()>>,
}

#[derive(Clone)]
pub struct DispatchPublisher {
    tx: mpsc::Sender<PublishRequest>,
    exchange: String,
    timeout: Duration,
}

impl DispatchPublisher {
    /// Declare `exchange` on `bus`, then spawn the owning task.
    ///
    /// Fails if the exchange cannot be declared, so no request is accepted before the
    /// exchange exists.
    pub async fn start(
        bus: Arc<dyn MessageBus>,
        exchange: impl Into<String>,
        queue_size: usize,
        timeout: Duration,
    ) -> BusResult<Self> {
        let exchange = exchange.into();
        bus.declare_exchange(&exchange).await?;

        let queue_size = queue_size.max(1);
        let (tx, rx) = mpsc::channel(queue_size);

        let worker_exchange = exchange.clone();
        tokio::spawn(async move {
            Self::run(rx, bus, worker_exchange).await;
        });

        tracing::info!(
            exchange = %exchange,
            queue_size = queue_size,
            timeout_secs = timeout.as_secs_f64(),
            "Dispatch publisher started"
        );

        Ok(Self {
            tx,
            exchange,
            timeout,
        })
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    /// Publish a generation job with `routing_key` (the caller's identity).
    #[tracing::instrument(skip(self, job), fields(exchange = %self.exchange))]
    pub async fn publish_job(&self, job: &GenerationJob, routing_key: &str) -> BusResult<()> {
        let payload = job
            .to_payload()
            .map_err(|e| BusError::Serialization(e.to_string()))?;
        self.publish(routing_key, payload).await
    }

    /// Queue a raw payload and wait for the bus outcome, bounded by the publish timeout.
    pub async fn publish(&self, routing_key: &str, payload: Vec<u8>) -> BusResult<()> {
        let (reply, outcome) = oneshot::channel();
        let request = PublishRequest {
            routing_key: routing_key.to_string(),
            payload,
            reply,
        };

        let exchange = self.exchange.clone();
        let submit = async {
            self.tx.send(request).await.map_err(|_| {
                BusError::NotConnected("dispatch publisher has stopped".to_string())
            })?;
            outcome.await.map_err(|_| {
                BusError::NotConnected("dispatch publisher dropped the request".to_string())
            })?
        };

        match tokio::time::timeout(self.timeout, submit).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    exchange = %exchange,
                    routing_key = %routing_key,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Publish exceeded deadline"
                );
                Err(BusError::Timeout(format!(
                    "no broker confirmation within {:?}",
                    self.timeout
                )))
            }
        }
    }

    async fn run(mut rx: mpsc::Receiver<PublishRequest>, bus: Arc<dyn MessageBus>, exchange: String) {
        while let Some(request) = rx.recv().await {
            let start = std::time::Instant::now();
            let result = bus
                .publish(&exchange, &request.routing_key, &request.payload)
                .await;

            match &result {
                Ok(()) => tracing::info!(
                    bus = bus.name(),
                    exchange = %exchange,
                    routing_key = %request.routing_key,
                    size_bytes = request.payload.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Message published"
                ),
                Err(e) => tracing::error!(
                    error = %e,
                    bus = bus.name(),
                    exchange = %exchange,
                    routing_key = %request.routing_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Message publish failed"
                ),
            }

            // The caller may have given up already.
            let _ = request.reply.send(result);
        }

        tracing::info!(exchange = %exchange, "Dispatch publisher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBus;
    use async_trait::async_trait;
    use congen_core::models::Tone;

    async fn publisher(bus: Arc<MemoryBus>) -> DispatchPublisher {
        DispatchPublisher::start(bus, "ai", 16, Duration::from_secs(5))
            .await
            .unwrap()
    }

    fn prompt_job(user_id: &str, prompt: &str) -> GenerationJob {
        GenerationJob::from_prompt(
            Tone::Serious,
            Some("clip1".to_string()),
            None,
            prompt.to_string(),
            "token".to_string(),
            user_id.to_string(),
        )
    }

    #[tokio::test]
    async fn test_payload_is_job_descriptor_routed_by_identity() {
        let bus = Arc::new(MemoryBus::new());
        let publisher = publisher(bus.clone()).await;
        let job = prompt_job("user_42", "a calm narration");

        publisher.publish_job(&job, "user_42").await.unwrap();

        let published = bus.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].exchange, "ai");
        assert_eq!(published[0].routing_key, "user_42");
        let decoded: GenerationJob = serde_json::from_slice(&published[0].payload).unwrap();
        assert_eq!(decoded, job);
    }

    #[tokio::test]
    async fn test_concurrent_publishers_preserve_per_caller_order() {
        let bus = Arc::new(MemoryBus::new());
        let publisher = publisher(bus.clone()).await;

        let mut handles = Vec::new();
        for user in ["user_a", "user_b", "user_c"] {
            let publisher = publisher.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    let job = prompt_job(user, &format!("{}", i));
                    publisher.publish_job(&job, user).await.unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let published = bus.published();
        assert_eq!(published.len(), 150);
        for user in ["user_a", "user_b", "user_c"] {
            let prompts: Vec<String> = published
                .iter()
                .filter(|m| m.routing_key == user)
                .map(|m| {
                    let job: GenerationJob = serde_json::from_slice(&m.payload).unwrap();
                    job.prompt.unwrap()
                })
                .collect();
            let expected: Vec<String> = (0..50).map(|i| i.to_string()).collect();
            assert_eq!(prompts, expected);
        }
    }

    #[tokio::test]
    async fn test_start_fails_when_bus_unavailable() {
        let bus = Arc::new(MemoryBus::new());
        bus.set_connected(false);
        let result = DispatchPublisher::start(bus, "ai", 16, Duration::from_secs(1)).await;
        assert!(matches!(result, Err(BusError::NotConnected(_))));
    }

    #[tokio::test]
    async fn test_lost_connection_surfaces_not_connected() {
        let bus = Arc::new(MemoryBus::new());
        let publisher = publisher(bus.clone()).await;
        bus.set_connected(false);

        let err = publisher
            .publish_job(&prompt_job("user_1", "x"), "user_1")
            .await
            .unwrap_err();
        assert!(matches!(err, BusError::NotConnected(_)));
    }

    #[tokio::test]
    async fn test_closed_queue_is_not_connected() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let publisher = DispatchPublisher {
            tx,
            exchange: "ai".to_string(),
            timeout: Duration::from_secs(1),
        };

        let err = publisher.publish("user_1", b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, BusError::NotConnected(_)));
    }

    /// Bus that never confirms.
    struct StalledBus;

    #[async_trait]
    impl MessageBus for StalledBus {
        async fn declare_exchange(&self, _exchange: &str) -> BusResult<()> {
            Ok(())
        }

        async fn publish(&self, _exchange: &str, _key: &str, _payload: &[u8]) -> BusResult<()> {
            std::future::pending::<()>().await;
            Ok(())
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    #[tokio::test]
    async fn test_unconfirmed_publish_times_out() {
        let publisher = DispatchPublisher::start(
            Arc::new(StalledBus),
            "ai",
            4,
            Duration::from_millis(50),
        )
        .await
        .unwrap();

        let err = publisher.publish("user_1", b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, BusError::Timeout(_)));
    }
}
