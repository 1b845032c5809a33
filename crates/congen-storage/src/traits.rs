//! Storage abstraction trait
//!
//! This module defines the `PartitionStore` trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage operation timed out: {0}")]
    Timeout(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for congen_core::AppError {
    fn from(err: StorageError) -> Self {
        use congen_core::AppError;
        match err {
            StorageError::NotFound(name) => {
                AppError::FileNotFound(format!("FILE NOT FOUND: {}", name))
            }
            StorageError::InvalidKey(msg) => AppError::BadRequest(format!("BAD REQUEST: {}", msg)),
            StorageError::Timeout(msg) => AppError::Timeout(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Per-tenant blob store.
///
/// Every call is scoped to exactly one partition; implementations must make it
/// impossible to reach an object of another partition through `name`.
/// Objects are write-once: there is no update, delete or listing.
#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Create the partition if it does not exist yet. Idempotent.
    async fn ensure_partition(&self, partition: &str) -> StorageResult<()>;

    /// Store `data` under `name`. A failed call must not leave a readable object behind.
    async fn put(&self, partition: &str, name: &str, data: Bytes) -> StorageResult<()>;

    /// Fetch a whole object. `StorageError::NotFound` when absent.
    async fn get(&self, partition: &str, name: &str) -> StorageResult<Bytes>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
