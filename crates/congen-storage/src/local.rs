use crate::keys;
use crate::traits::{PartitionStore, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const STAGING_DIR: &str = ".staging";

/// Local filesystem storage implementation
///
/// Each partition is a directory under `base_path`. Writes go to a staging file
/// first and are renamed into place, so readers never observe a partial object.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance rooted at `base_path`
    /// (e.g., "/var/lib/congen/storage").
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(base_path.join(STAGING_DIR))
            .await
            .map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    base_path.display(),
                    e
                ))
            })?;

        Ok(LocalStorage { base_path })
    }

    fn partition_dir(&self, partition: &str) -> StorageResult<PathBuf> {
        keys::validate_partition(partition)?;
        Ok(self.base_path.join(partition))
    }

    /// Convert (partition, name) to a filesystem path.
    ///
    /// Both segments are single path components, so the result always stays inside
    /// `base_path`.
    fn object_path(&self, partition: &str, name: &str) -> StorageResult<PathBuf> {
        keys::validate_name(name)?;
        Ok(self.partition_dir(partition)?.join(name))
    }

    fn staging_path(&self) -> PathBuf {
        self.base_path
            .join(STAGING_DIR)
            .join(format!("{}.tmp", Uuid::new_v4()))
    }

    async fn write_staged(staging: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(staging).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }
}

#[async_trait]
impl PartitionStore for LocalStorage {
    async fn ensure_partition(&self, partition: &str) -> StorageResult<()> {
        let dir = self.partition_dir(partition)?;
        fs::create_dir_all(&dir).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to create partition {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(())
    }

    async fn put(&self, partition: &str, name: &str, data: Bytes) -> StorageResult<()> {
        let path = self.object_path(partition, name)?;
        let staging = self.staging_path();
        let size = data.len();
        let start = std::time::Instant::now();

        if let Err(e) = Self::write_staged(&staging, &data).await {
            let _ = fs::remove_file(&staging).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to write file {}: {}",
                staging.display(),
                e
            )));
        }

        if let Err(e) = fs::rename(&staging, &path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to move file into {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            path = %path.display(),
            partition = %partition,
            name = %name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn get(&self, partition: &str, name: &str) -> StorageResult<Bytes> {
        let path = self.object_path(partition, name)?;
        let start = std::time::Instant::now();

        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(name.to_string()),
            _ => StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            )),
        })?;

        tracing::info!(
            path = %path.display(),
            partition = %partition,
            name = %name,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(Bytes::from(data))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn storage() -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_put_then_get_round_trip() {
        let (_dir, storage) = storage().await;
        storage.ensure_partition("tenant-1").await.unwrap();
        storage
            .put("tenant-1", "a.bin", Bytes::from_static(b"\x00\x01binary\xff"))
            .await
            .unwrap();

        let data = storage.get("tenant-1", "a.bin").await.unwrap();
        assert_eq!(&data[..], b"\x00\x01binary\xff");
    }

    #[tokio::test]
    async fn test_ensure_partition_is_idempotent() {
        let (dir, storage) = storage().await;
        storage.ensure_partition("tenant-1").await.unwrap();
        storage.ensure_partition("tenant-1").await.unwrap();
        assert!(dir.path().join("tenant-1").is_dir());
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let (_dir, storage) = storage().await;
        storage.ensure_partition("tenant-1").await.unwrap();
        let err = storage.get("tenant-1", "missing.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let (_dir, storage) = storage().await;
        storage.ensure_partition("tenant-a").await.unwrap();
        storage.ensure_partition("tenant-b").await.unwrap();
        storage
            .put("tenant-a", "doc.txt", Bytes::from_static(b"secret"))
            .await
            .unwrap();

        let err = storage.get("tenant-b", "doc.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));

        let err = storage.get("tenant-b", "../tenant-a/doc.txt").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_failed_put_leaves_no_object() {
        let (dir, storage) = storage().await;
        // Partition directory never created, so the final rename fails.
        let err = storage
            .put("tenant-x", "a.txt", Bytes::from_static(b"data"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UploadFailed(_)));
        assert!(!dir.path().join("tenant-x").join("a.txt").exists());

        let staged = std::fs::read_dir(dir.path().join(STAGING_DIR)).unwrap().count();
        assert_eq!(staged, 0);
    }
}
