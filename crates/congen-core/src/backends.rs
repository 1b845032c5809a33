use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Selected with `STORAGE_BACKEND`. `Memory` is for development and tests only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    S3,
    Azure,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "s3" => Ok(StorageBackend::S3),
            "azure" => Ok(StorageBackend::Azure),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Local => write!(f, "local"),
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Azure => write!(f, "azure"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Message bus backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusBackend {
    Amqp,
    Memory,
}

impl FromStr for BusBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amqp" | "rabbitmq" => Ok(BusBackend::Amqp),
            "memory" => Ok(BusBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid bus backend: {}", s)),
        }
    }
}

impl Display for BusBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BusBackend::Amqp => write!(f, "amqp"),
            BusBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Identity provider backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityBackend {
    Clerk,
    Static,
}

impl FromStr for IdentityBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clerk" => Ok(IdentityBackend::Clerk),
            "static" => Ok(IdentityBackend::Static),
            _ => Err(anyhow::anyhow!("Invalid identity backend: {}", s)),
        }
    }
}

impl Display for IdentityBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            IdentityBackend::Clerk => write!(f, "clerk"),
            IdentityBackend::Static => write!(f, "static"),
        }
    }
}
