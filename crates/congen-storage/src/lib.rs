//! Congen Storage Library
//!
//! Storage abstraction and implementations for Congen: the `PartitionStore` trait,
//! a local filesystem backend, `object_store` backends (S3, Azure Blob, in-memory)
//! and the `ObjectGateway` used by request handling.
//!
//! # Storage key format
//!
//! Objects are tenant-scoped: every object lives in exactly one partition and is
//! addressed as `{partition}/{name}` on all backends. Names are generated as
//! `{uuid}.{extension}`. Neither segment may contain a path separator, `..` or a
//! leading `.`; validation is centralized in the `keys` module.

pub mod factory;
pub mod gateway;
pub mod keys;
pub mod local;
pub mod object;
pub mod traits;

// Re-export commonly used types
pub use congen_core::StorageBackend;
pub use factory::create_storage;
pub use gateway::ObjectGateway;
pub use keys::validate_partition;
pub use local::LocalStorage;
pub use object::ObjectStorage;
pub use traits::{PartitionStore, StorageError, StorageResult};
