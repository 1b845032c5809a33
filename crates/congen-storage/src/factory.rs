use crate::{LocalStorage, ObjectStorage, PartitionStore, StorageBackend, StorageError, StorageResult};
use congen_core::StorageConfig;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &StorageConfig) -> StorageResult<Arc<dyn PartitionStore>> {
    match config.backend {
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;

            let storage = ObjectStorage::s3(bucket, region, config.s3_endpoint.clone())?;
            Ok(Arc::new(storage))
        }

        StorageBackend::Azure => {
            let missing = |name: &str| StorageError::ConfigError(format!("{} not configured", name));
            let account = config
                .azure_account
                .clone()
                .ok_or_else(|| missing("AZURE_STORAGE_ACCOUNT"))?;
            let access_key = config
                .azure_access_key
                .clone()
                .ok_or_else(|| missing("AZURE_STORAGE_ACCESS_KEY"))?;
            let container = config
                .azure_container
                .clone()
                .ok_or_else(|| missing("AZURE_STORAGE_CONTAINER"))?;

            let storage = ObjectStorage::azure(account, access_key, container)?;
            Ok(Arc::new(storage))
        }

        StorageBackend::Local => {
            let storage = LocalStorage::new(config.local_path.clone()).await?;
            Ok(Arc::new(storage))
        }

        StorageBackend::Memory => Ok(Arc::new(ObjectStorage::in_memory())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: StorageBackend, local_path: &str) -> StorageConfig {
        StorageConfig {
            backend,
            local_path: local_path.to_string(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            azure_account: None,
            azure_access_key: None,
            azure_container: None,
            timeout_secs: 30,
        }
    }

    #[tokio::test]
    async fn test_creates_local_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("storage");
        let storage = create_storage(&config(StorageBackend::Local, path.to_str().unwrap()))
            .await
            .unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
        assert!(path.is_dir());
    }

    #[tokio::test]
    async fn test_s3_without_bucket_is_config_error() {
        let result = create_storage(&config(StorageBackend::S3, "")).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
