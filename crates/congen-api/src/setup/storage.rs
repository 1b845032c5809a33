//! Storage setup and initialization

use std::time::Duration;

use anyhow::Result;
use congen_core::Config;
use congen_storage::{create_storage, ObjectGateway};

pub async fn setup_storage(config: &Config) -> Result<ObjectGateway> {
    tracing::info!("Initializing object store...");
    let store = create_storage(&config.storage).await?;
    let backend_type = store.backend_type();

    let gateway = ObjectGateway::new(store, Duration::from_secs(config.storage.timeout_secs));
    tracing::info!(
        backend = %backend_type,
        timeout_secs = config.storage.timeout_secs,
        "Object store initialized"
    );

    Ok(gateway)
}
