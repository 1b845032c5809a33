//! Object store gateway
//!
//! Front door of the storage layer used by request handling: collision-free naming,
//! per-call deadlines and ordered multi-get on top of any [`PartitionStore`].

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{self, StreamExt};

use crate::keys;
use crate::traits::{PartitionStore, StorageError, StorageResult};
use crate::StorageBackend;

/// Maximum number of concurrent fetches issued by [`ObjectGateway::get_many`].
const GET_MANY_CONCURRENCY: usize = 8;

#[derive(Clone)]
pub struct ObjectGateway {
    store: Arc<dyn PartitionStore>,
    timeout: Duration,
}

impl ObjectGateway {
    pub fn new(store: Arc<dyn PartitionStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn backend_type(&self) -> StorageBackend {
        self.store.backend_type()
    }

    /// Store `data` as a new object and return its generated `{uuid}.{extension}` name.
    ///
    /// The write runs on its own task: if the caller goes away, the upload still
    /// completes rather than being torn down halfway. When the deadline expires the
    /// caller gets `StorageError::Timeout` and the write may still land later.
    pub async fn put(
        &self,
        partition: &str,
        data: Bytes,
        extension: &str,
    ) -> StorageResult<String> {
        if extension.is_empty() {
            return Err(StorageError::InvalidKey(
                "extension must not be empty".to_string(),
            ));
        }
        keys::validate_partition(partition)?;
        let name = keys::generate_object_name(extension)?;

        let store = Arc::clone(&self.store);
        let task_partition = partition.to_string();
        let task_name = name.clone();
        let upload = tokio::spawn(async move {
            store.ensure_partition(&task_partition).await?;
            store.put(&task_partition, &task_name, data).await
        });

        match tokio::time::timeout(self.timeout, upload).await {
            Ok(Ok(Ok(()))) => Ok(name),
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(join_error)) => Err(StorageError::UploadFailed(format!(
                "upload task failed: {}",
                join_error
            ))),
            Err(_) => {
                tracing::warn!(
                    partition = %partition,
                    name = %name,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Upload exceeded deadline"
                );
                Err(StorageError::Timeout(format!("upload of {}", name)))
            }
        }
    }

    pub async fn get(&self, partition: &str, name: &str) -> StorageResult<Bytes> {
        match tokio::time::timeout(self.timeout, self.store.get(partition, name)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    partition = %partition,
                    name = %name,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Download exceeded deadline"
                );
                Err(StorageError::Timeout(format!("download of {}", name)))
            }
        }
    }

    /// Fetch several objects. The output is aligned with `names`; each slot
    /// succeeds or fails on its own.
    pub async fn get_many(&self, partition: &str, names: &[String]) -> Vec<StorageResult<Bytes>> {
        let fetches: Vec<_> = names.iter().map(|name| self.get(partition, name)).collect();
        stream::iter(fetches)
            .buffered(GET_MANY_CONCURRENCY)
            .collect()
            .await
    }
}
