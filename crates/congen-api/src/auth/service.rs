//! Caller resolution: credential → identity → partition.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::auth::credential::resolve_identity;
use crate::auth::{AuthError, CallerContext, IdentityProvider, JwksVerifier};

const MAX_CACHE_TTL_SECS: u64 = 86_400;

#[derive(Clone)]
struct CachedPartition {
    identity: String,
    partition: String,
    expires_at: DateTime<Utc>,
}

/// Short-lived credential → partition cache. Keys are SHA-256 digests, so raw
/// credentials are never held in memory longer than the request.
struct PartitionCache {
    entries: RwLock<HashMap<String, CachedPartition>>,
    ttl: chrono::Duration,
}

impl PartitionCache {
    fn new(ttl_secs: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl: chrono::Duration::seconds(ttl_secs.min(MAX_CACHE_TTL_SECS) as i64),
        }
    }

    fn key(credential: &str) -> String {
        hex::encode(Sha256::digest(credential.as_bytes()))
    }

    async fn get(&self, key: &str) -> Option<CachedPartition> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Utc::now())
            .cloned()
    }

    async fn insert(&self, key: String, identity: String, partition: String) {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key,
            CachedPartition {
                identity,
                partition,
                expires_at: now + self.ttl,
            },
        );
    }
}

pub struct IdentityService {
    provider: Arc<dyn IdentityProvider>,
    verifier: Option<JwksVerifier>,
    cache: Option<PartitionCache>,
}

impl IdentityService {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            verifier: None,
            cache: None,
        }
    }

    /// Verify credential signatures against a JWKS before resolving them.
    pub fn with_verifier(mut self, verifier: JwksVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Cache resolved partitions for `ttl_secs`. Zero leaves caching off.
    pub fn with_partition_cache(mut self, ttl_secs: u64) -> Self {
        self.cache = (ttl_secs > 0).then(|| PartitionCache::new(ttl_secs));
        self
    }

    /// Resolve who is calling and which partition they own.
    pub async fn resolve(&self, credential: &str) -> Result<CallerContext, AuthError> {
        let identity = match &self.verifier {
            Some(verifier) => verifier.verify(credential).await?,
            None => resolve_identity(credential)?,
        };

        let cache_key = self.cache.as_ref().map(|_| PartitionCache::key(credential));
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            if let Some(hit) = cache.get(key).await {
                tracing::debug!(identity = %hit.identity, "Partition cache hit");
                return Ok(CallerContext {
                    identity: hit.identity,
                    partition: hit.partition,
                    credential: credential.to_string(),
                });
            }
        }

        let partition = self.resolve_partition(&identity).await?;

        if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
            cache.insert(key, identity.clone(), partition.clone()).await;
        }

        Ok(CallerContext {
            identity,
            partition,
            credential: credential.to_string(),
        })
    }

    /// Look up the partition assigned to `identity`.
    pub async fn resolve_partition(&self, identity: &str) -> Result<String, AuthError> {
        let profile = self.provider.lookup_user(identity).await?;

        let partition = profile
            .partition()
            .ok_or_else(|| AuthError::NoPartition(identity.to_string()))?;

        // A value that cannot name a partition is as good as none.
        if let Err(e) = congen_storage::validate_partition(partition) {
            tracing::warn!(
                identity = %identity,
                provider = self.provider.name(),
                error = %e,
                "Assigned partition name is not usable"
            );
            return Err(AuthError::NoPartition(identity.to_string()));
        }

        Ok(partition.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{StaticIdentityProvider, UserProfile};
    use async_trait::async_trait;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn credential_for(sub: &str) -> String {
        format!(
            "eyJhbGciOiJSUzI1NiJ9.{}.sig",
            URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{}"}}"#, sub))
        )
    }

    struct CountingProvider {
        inner: StaticIdentityProvider,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl IdentityProvider for CountingProvider {
        async fn lookup_user(&self, identity: &str) -> Result<UserProfile, AuthError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.lookup_user(identity).await
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn counting(partitions: &[(&str, &str)]) -> Arc<CountingProvider> {
        Arc::new(CountingProvider {
            inner: StaticIdentityProvider::new(
                partitions
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            lookups: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_resolve_returns_identity_and_partition() {
        let service = IdentityService::new(counting(&[("user_42", "tenant-42")]));
        let credential = credential_for("user_42");
        let caller = service.resolve(&credential).await.unwrap();
        assert_eq!(caller.identity, "user_42");
        assert_eq!(caller.partition, "tenant-42");
        assert_eq!(caller.credential, credential);
    }

    #[tokio::test]
    async fn test_missing_partition() {
        let service = IdentityService::new(counting(&[]));
        let err = service.resolve(&credential_for("user_1")).await.unwrap_err();
        assert!(matches!(err, AuthError::NoPartition(_)));
    }

    #[tokio::test]
    async fn test_unusable_partition_name_is_no_partition() {
        let service = IdentityService::new(counting(&[("user_1", "../tenant-2")]));
        let err = service.resolve(&credential_for("user_1")).await.unwrap_err();
        assert!(matches!(err, AuthError::NoPartition(_)));
    }

    #[tokio::test]
    async fn test_malformed_credential_skips_provider() {
        let provider = counting(&[("user_1", "tenant-1")]);
        let service = IdentityService::new(provider.clone());
        let err = service.resolve("abc.%%%.def").await.unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
        assert_eq!(provider.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_resolves_every_request_without_cache() {
        let provider = counting(&[("user_1", "tenant-1")]);
        let service = IdentityService::new(provider.clone()).with_partition_cache(0);
        let credential = credential_for("user_1");
        service.resolve(&credential).await.unwrap();
        service.resolve(&credential).await.unwrap();
        assert_eq!(provider.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let provider = counting(&[("user_1", "tenant-1"), ("user_2", "tenant-2")]);
        let service = IdentityService::new(provider.clone()).with_partition_cache(60);

        let first = service.resolve(&credential_for("user_1")).await.unwrap();
        let second = service.resolve(&credential_for("user_1")).await.unwrap();
        assert_eq!(first.partition, second.partition);
        assert_eq!(provider.lookups.load(Ordering::SeqCst), 1);

        let other = service.resolve(&credential_for("user_2")).await.unwrap();
        assert_eq!(other.partition, "tenant-2");
        assert_eq!(provider.lookups.load(Ordering::SeqCst), 2);
    }
}
