//! Message bus setup: connect, declare the exchange, start the publisher task.

use std::time::Duration;

use anyhow::{Context, Result};
use congen_core::Config;
use congen_dispatch::{create_bus, DispatchPublisher};

pub async fn setup_dispatch(config: &Config) -> Result<DispatchPublisher> {
    tracing::info!(backend = %config.bus.backend, "Connecting to message bus...");
    let bus = create_bus(&config.bus)
        .await
        .context("Failed to connect to message bus")?;

    let publisher = DispatchPublisher::start(
        bus,
        config.bus.exchange.clone(),
        config.bus.queue_size,
        Duration::from_secs(config.bus.timeout_secs),
    )
    .await
    .with_context(|| format!("Failed to declare exchange {}", config.bus.exchange))?;

    Ok(publisher)
}
