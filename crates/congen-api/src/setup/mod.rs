//! Application setup and initialization
//!
//! Every process-wide handle (object store client, bus connection, identity
//! client) is constructed here before the router exists, so no request can be
//! accepted ahead of initialization.

pub mod dispatch;
pub mod identity;
pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use anyhow::{Context, Result};
use congen_core::Config;

use crate::services::{Orchestrator, ServiceCatalog};
use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Telemetry first so validation failures are logged
    crate::telemetry::init_telemetry(config.is_production())?;

    validation::validate_config(&config).context("Configuration validation failed")?;
    tracing::info!("Configuration loaded and validated successfully");

    let gateway = storage::setup_storage(&config).await?;
    let publisher = dispatch::setup_dispatch(&config).await?;
    let identity = identity::setup_identity(&config)?;

    let catalog = match &config.service_catalog_path {
        Some(path) => ServiceCatalog::from_file(path)?,
        None => ServiceCatalog::placeholder(),
    };

    let orchestrator = Orchestrator::new(gateway, publisher, Arc::new(catalog));
    let state = Arc::new(AppState::new(orchestrator, identity));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
