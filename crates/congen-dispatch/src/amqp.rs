use async_trait::async_trait;
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions};
use lapin::publisher_confirm::Confirmation;
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};

use crate::bus::{BusError, BusResult, MessageBus};

/// Persistent delivery, survives a broker restart once routed to a durable queue.
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// AMQP 0-9-1 bus (RabbitMQ) over a single connection and channel.
///
/// The channel runs in publisher-confirm mode, so `publish` returns only after the
/// broker acked the message.
pub struct AmqpBus {
    connection: Connection,
    channel: Channel,
}

impl AmqpBus {
    pub async fn connect(url: &str) -> BusResult<Self> {
        let start = std::time::Instant::now();

        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| BusError::NotConnected(format!("failed to connect: {}", e)))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| BusError::NotConnected(format!("failed to open channel: {}", e)))?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(map_lapin_error)?;

        tracing::info!(
            channel_id = channel.id(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Connected to AMQP broker"
        );

        Ok(Self {
            connection,
            channel,
        })
    }

    fn ensure_connected(&self) -> BusResult<()> {
        if !self.connection.status().connected() || !self.channel.status().connected() {
            return Err(BusError::NotConnected(
                "AMQP connection or channel is closed".to_string(),
            ));
        }
        Ok(())
    }
}

fn map_lapin_error(err: lapin::Error) -> BusError {
    match err {
        lapin::Error::InvalidChannelState(_)
        | lapin::Error::InvalidConnectionState(_)
        | lapin::Error::IOError(_) => BusError::NotConnected(err.to_string()),
        other => BusError::Protocol(other.to_string()),
    }
}

#[async_trait]
impl MessageBus for AmqpBus {
    async fn declare_exchange(&self, exchange: &str) -> BusResult<()> {
        self.ensure_connected()?;

        self.channel
            .exchange_declare(
                exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(map_lapin_error)?;

        tracing::info!(exchange = %exchange, "Declared durable topic exchange");
        Ok(())
    }

    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> BusResult<()> {
        self.ensure_connected()?;

        let properties = BasicProperties::default()
            .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
            .with_content_type("application/json".into());

        let confirmation = self
            .channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                payload,
                properties,
            )
            .await
            .map_err(map_lapin_error)?
            .await
            .map_err(map_lapin_error)?;

        match confirmation {
            Confirmation::Nack(_) => Err(BusError::Rejected(format!(
                "broker nacked message for routing key {}",
                routing_key
            ))),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "amqp"
    }
}
