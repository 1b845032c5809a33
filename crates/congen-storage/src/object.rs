use crate::keys;
use crate::traits::{PartitionStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload, Result as ObjectResult};
use std::sync::Arc;

/// Storage over an `object_store` bucket or container.
///
/// A partition is a top-level key prefix. Object stores have no directories to
/// create, so `ensure_partition` only validates the name. Single-shot `put` is
/// atomic on every supported provider.
#[derive(Clone)]
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    backend: StorageBackend,
    /// Bucket / container name, for logs
    location: String,
}

impl ObjectStorage {
    /// S3 or an S3-compatible provider.
    ///
    /// * `endpoint_url` - custom endpoint (e.g., "http://localhost:9000" for MinIO)
    pub fn s3(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self {
            store: Arc::new(store),
            backend: StorageBackend::S3,
            location: bucket,
        })
    }

    /// Azure Blob Storage with a shared key.
    pub fn azure(account: String, access_key: String, container: String) -> StorageResult<Self> {
        let store = MicrosoftAzureBuilder::new()
            .with_account(account)
            .with_access_key(access_key)
            .with_container_name(container.clone())
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self {
            store: Arc::new(store),
            backend: StorageBackend::Azure,
            location: container,
        })
    }

    /// Process-local store for development and tests. Contents are lost on exit.
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            backend: StorageBackend::Memory,
            location: "memory".to_string(),
        }
    }
}

#[async_trait]
impl PartitionStore for ObjectStorage {
    async fn ensure_partition(&self, partition: &str) -> StorageResult<()> {
        keys::validate_partition(partition)
    }

    async fn put(&self, partition: &str, name: &str, data: Bytes) -> StorageResult<()> {
        let key = keys::object_key(partition, name)?;
        let size = data.len() as u64;
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.put(&location, PutPayload::from(data)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                backend = %self.backend,
                location = %self.location,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object store upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            backend = %self.backend,
            location = %self.location,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object store upload successful"
        );

        Ok(())
    }

    async fn get(&self, partition: &str, name: &str) -> StorageResult<Bytes> {
        let key = keys::object_key(partition, name)?;
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(name.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    backend = %self.backend,
                    location = %self.location,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object store download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            backend = %self.backend,
            location = %self.location,
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object store download successful"
        );

        Ok(bytes)
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}
