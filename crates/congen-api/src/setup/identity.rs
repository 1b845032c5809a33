//! Identity provider setup

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use congen_core::{Config, IdentityBackend};

use crate::auth::{
    ClerkIdentityProvider, IdentityProvider, IdentityService, JwksVerifier,
    StaticIdentityProvider,
};

pub fn setup_identity(config: &Config) -> Result<Arc<IdentityService>> {
    let identity = &config.identity;
    let timeout = Duration::from_secs(identity.timeout_secs);

    let provider: Arc<dyn IdentityProvider> = match identity.backend {
        IdentityBackend::Clerk => {
            let secret_key = identity
                .clerk_secret_key
                .clone()
                .context("CLERK_SECRET_KEY must be set when using the clerk identity backend")?;
            Arc::new(
                ClerkIdentityProvider::new(identity.clerk_api_url.clone(), secret_key, timeout)
                    .context("Failed to create Clerk client")?,
            )
        }
        IdentityBackend::Static => {
            tracing::warn!(
                identities = identity.static_partitions.len(),
                "Using static identity map - credentials are not verified upstream"
            );
            Arc::new(StaticIdentityProvider::new(
                identity.static_partitions.clone(),
            ))
        }
    };

    let mut service = IdentityService::new(provider)
        .with_partition_cache(identity.partition_cache_ttl_secs);

    if let Some(jwks_url) = &identity.clerk_jwks_url {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create JWKS client")?;
        service = service.with_verifier(JwksVerifier::new(client, jwks_url.clone(), None));
        tracing::info!(jwks_url = %jwks_url, "Credential signature verification enabled");
    }

    tracing::info!(
        backend = %identity.backend,
        partition_cache_ttl_secs = identity.partition_cache_ttl_secs,
        "Identity resolution initialized"
    );

    Ok(Arc::new(service))
}
