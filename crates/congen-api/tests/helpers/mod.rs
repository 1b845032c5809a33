//! Test helpers: build AppState and router for integration tests.
//!
//! Everything runs in-process: in-memory object store, in-memory bus and a
//! static identity map. Run with `cargo test -p congen-api`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bytes::Bytes;
use congen_api::auth::{IdentityService, StaticIdentityProvider};
use congen_api::services::{Orchestrator, ServiceCatalog};
use congen_api::setup::routes;
use congen_api::state::AppState;
use congen_core::{Config, StorageBackend};
use congen_dispatch::{DispatchPublisher, MemoryBus, PublishedMessage};
use congen_storage::{ObjectGateway, ObjectStorage, PartitionStore, StorageResult};

pub const EXCHANGE: &str = "ai";

/// In-memory store that counts writes.
pub struct RecordingStore {
    inner: ObjectStorage,
    puts: AtomicUsize,
}

impl RecordingStore {
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PartitionStore for RecordingStore {
    async fn ensure_partition(&self, partition: &str) -> StorageResult<()> {
        self.inner.ensure_partition(partition).await
    }

    async fn put(&self, partition: &str, name: &str, data: Bytes) -> StorageResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(partition, name, data).await
    }

    async fn get(&self, partition: &str, name: &str) -> StorageResult<Bytes> {
        self.inner.get(partition, name).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<RecordingStore>,
    pub bus: Arc<MemoryBus>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.bus.published()
    }
}

fn test_config() -> Config {
    let vars = HashMap::from([
        ("STORAGE_BACKEND", "memory"),
        ("BUS_BACKEND", "memory"),
        ("IDENTITY_BACKEND", "static"),
    ]);
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
        .expect("test configuration is valid")
}

/// Build the app with `partitions` as the identity → partition map.
pub async fn setup_test_app(partitions: &[(&str, &str)]) -> TestApp {
    let store = Arc::new(RecordingStore {
        inner: ObjectStorage::in_memory(),
        puts: AtomicUsize::new(0),
    });
    let bus = Arc::new(MemoryBus::new());

    let gateway = ObjectGateway::new(store.clone(), Duration::from_secs(5));
    let publisher = DispatchPublisher::start(bus.clone(), EXCHANGE, 16, Duration::from_secs(5))
        .await
        .expect("publisher starts on the memory bus");

    let provider = StaticIdentityProvider::new(
        partitions
            .iter()
            .map(|(identity, partition)| (identity.to_string(), partition.to_string()))
            .collect(),
    );
    let identity = Arc::new(IdentityService::new(Arc::new(provider)));

    let orchestrator = Orchestrator::new(gateway, publisher, Arc::new(ServiceCatalog::placeholder()));
    let state = Arc::new(AppState::new(orchestrator, identity));

    let router = routes::setup_routes(&test_config(), state).expect("routes build");
    let server = TestServer::new(router).expect("test server starts");

    TestApp { server, store, bus }
}

/// Unsigned credential whose claims carry `sub`.
pub fn credential_for(sub: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{}"}}"#, sub))
    )
}
