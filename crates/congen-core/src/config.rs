//! Configuration module
//!
//! Settings for the HTTP server, the object store, the message bus and the
//! identity provider. Everything is read from the environment (a `.env` file is
//! loaded first when present).

use std::collections::HashMap;
use std::env;

use crate::backends::{BusBackend, IdentityBackend, StorageBackend};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_LOCAL_STORAGE_PATH: &str = "./data/storage";
const STORAGE_TIMEOUT_SECS: u64 = 30;
const BUS_EXCHANGE: &str = "ai";
const BUS_TIMEOUT_SECS: u64 = 10;
const BUS_QUEUE_SIZE: usize = 1024;
const CLERK_API_URL: &str = "https://api.clerk.com";
const IDENTITY_TIMEOUT_SECS: u64 = 10;
const MAX_UPLOAD_SIZE_MB: usize = 100;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub max_upload_size_bytes: usize,
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_path: String,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub s3_endpoint: Option<String>,
    pub azure_account: Option<String>,
    pub azure_access_key: Option<String>,
    pub azure_container: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct BusConfig {
    pub backend: BusBackend,
    pub amqp_url: Option<String>,
    pub exchange: String,
    pub timeout_secs: u64,
    pub queue_size: usize,
}

#[derive(Clone, Debug)]
pub struct IdentityConfig {
    pub backend: IdentityBackend,
    pub clerk_secret_key: Option<String>,
    pub clerk_api_url: String,
    /// When set, bearer credentials are signature-checked against this JWKS before use.
    pub clerk_jwks_url: Option<String>,
    pub timeout_secs: u64,
    /// identity -> partition, static backend only
    pub static_partitions: HashMap<String, String>,
    /// 0 disables the partition cache
    pub partition_cache_ttl_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub bus: BusConfig,
    pub identity: IdentityConfig,
    pub service_catalog_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins: Vec<String> = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_upload_size_mb = var("MAX_UPLOAD_SIZE_MB")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let server = ServerConfig {
            port: var("PORT")
                .unwrap_or_else(|| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            max_upload_size_bytes: max_upload_size_mb
                .checked_mul(1024 * 1024)
                .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large"))?,
        };

        let storage = StorageConfig {
            backend: match var("STORAGE_BACKEND") {
                Some(v) => v.parse()?,
                None => StorageBackend::Local,
            },
            local_path: var("LOCAL_STORAGE_PATH")
                .unwrap_or_else(|| DEFAULT_LOCAL_STORAGE_PATH.to_string()),
            s3_bucket: var("S3_BUCKET"),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            azure_account: var("AZURE_STORAGE_ACCOUNT"),
            azure_access_key: var("AZURE_STORAGE_ACCESS_KEY"),
            azure_container: var("AZURE_STORAGE_CONTAINER"),
            timeout_secs: var("STORAGE_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(STORAGE_TIMEOUT_SECS),
        };

        let amqp_url = var("AMQP_URL").or_else(|| {
            var("RABBIT_HOST").map(|host| {
                let user = var("RABBIT_USER").unwrap_or_else(|| "guest".to_string());
                let password = var("RABBIT_PASSWORD").unwrap_or_else(|| "guest".to_string());
                format!("amqp://{}:{}@{}:5672/%2f", user, password, host)
            })
        });

        let bus = BusConfig {
            backend: match var("BUS_BACKEND") {
                Some(v) => v.parse()?,
                None => BusBackend::Amqp,
            },
            amqp_url,
            exchange: var("BUS_EXCHANGE").unwrap_or_else(|| BUS_EXCHANGE.to_string()),
            timeout_secs: var("BUS_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(BUS_TIMEOUT_SECS),
            queue_size: var("BUS_QUEUE_SIZE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(BUS_QUEUE_SIZE),
        };

        let identity = IdentityConfig {
            backend: match var("IDENTITY_BACKEND") {
                Some(v) => v.parse()?,
                None => IdentityBackend::Clerk,
            },
            clerk_secret_key: var("CLERK_SECRET_KEY"),
            clerk_api_url: var("CLERK_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| CLERK_API_URL.to_string()),
            clerk_jwks_url: var("CLERK_JWKS_URL"),
            timeout_secs: var("IDENTITY_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(IDENTITY_TIMEOUT_SECS),
            static_partitions: var("STATIC_PARTITIONS")
                .map(|v| parse_static_partitions(&v))
                .transpose()?
                .unwrap_or_default(),
            partition_cache_ttl_secs: var("PARTITION_CACHE_TTL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        };

        let config = Config {
            server,
            storage,
            bus,
            identity,
            service_catalog_path: var("SERVICE_CATALOG_PATH"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.server.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.server.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.storage.timeout_secs == 0 {
            return Err(anyhow::anyhow!("STORAGE_TIMEOUT_SECS must be greater than 0"));
        }
        if self.bus.timeout_secs == 0 {
            return Err(anyhow::anyhow!("BUS_TIMEOUT_SECS must be greater than 0"));
        }
        if self.identity.timeout_secs == 0 {
            return Err(anyhow::anyhow!("IDENTITY_TIMEOUT_SECS must be greater than 0"));
        }
        if self.bus.queue_size == 0 {
            return Err(anyhow::anyhow!("BUS_QUEUE_SIZE must be greater than 0"));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Azure => {
                if self.storage.azure_account.is_none()
                    || self.storage.azure_access_key.is_none()
                    || self.storage.azure_container.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "AZURE_STORAGE_ACCOUNT, AZURE_STORAGE_ACCESS_KEY and AZURE_STORAGE_CONTAINER must be set when using Azure storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_path.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        if self.bus.backend == BusBackend::Amqp && self.bus.amqp_url.is_none() {
            return Err(anyhow::anyhow!(
                "AMQP_URL (or RABBIT_HOST) must be set when using the amqp bus backend"
            ));
        }

        if self.identity.backend == IdentityBackend::Clerk
            && self.identity.clerk_secret_key.is_none()
        {
            return Err(anyhow::anyhow!(
                "CLERK_SECRET_KEY must be set when using the clerk identity backend"
            ));
        }

        Ok(())
    }
}

/// Parse `identity=partition` pairs separated by commas.
fn parse_static_partitions(raw: &str) -> Result<HashMap<String, String>, anyhow::Error> {
    let mut partitions = HashMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (identity, partition) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("STATIC_PARTITIONS entry '{}' must be identity=partition", pair))?;
        partitions.insert(identity.trim().to_string(), partition.trim().to_string());
    }
    Ok(partitions)
}
