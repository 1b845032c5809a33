//! Identity metadata lookup.
//!
//! The partition assigned to a caller lives in the identity provider's private
//! user metadata under the `container` key.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::auth::AuthError;

/// Metadata key holding the caller's partition name.
pub const PARTITION_METADATA_KEY: &str = "container";

/// Characters escaped in a user id path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'-')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub private_metadata: Map<String, Value>,
}

impl UserProfile {
    /// Assigned partition, if any. Non-string and blank values count as unassigned.
    pub fn partition(&self) -> Option<&str> {
        self.private_metadata
            .get(PARTITION_METADATA_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|partition| !partition.is_empty())
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fetch the profile of `identity`. `AuthError::UnknownUser` when it does not exist.
    async fn lookup_user(&self, identity: &str) -> Result<UserProfile, AuthError>;

    fn name(&self) -> &'static str;
}

/// Clerk backend API client.
pub struct ClerkIdentityProvider {
    client: reqwest::Client,
    api_url: String,
    secret_key: String,
}

impl ClerkIdentityProvider {
    pub fn new(
        api_url: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AuthError::Provider(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }
}

#[async_trait]
impl IdentityProvider for ClerkIdentityProvider {
    async fn lookup_user(&self, identity: &str) -> Result<UserProfile, AuthError> {
        let url = format!(
            "{}/v1/users/{}",
            self.api_url,
            utf8_percent_encode(identity, PATH_SEGMENT)
        );
        let start = std::time::Instant::now();

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthError::Timeout(format!("user lookup for {}", identity))
                } else {
                    AuthError::Provider(format!("user lookup request failed: {}", e))
                }
            })?;

        let status = response.status();
        tracing::debug!(
            identity = %identity,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Clerk user lookup"
        );

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AuthError::UnknownUser(identity.to_string()));
        }
        if !status.is_success() {
            return Err(AuthError::Provider(format!(
                "user lookup returned {}",
                status
            )));
        }

        response
            .json::<UserProfile>()
            .await
            .map_err(|e| AuthError::Provider(format!("failed to parse user profile: {}", e)))
    }

    fn name(&self) -> &'static str {
        "clerk"
    }
}

/// Fixed identity → partition map for development and tests.
///
/// Identities missing from the map resolve to a profile without a partition.
pub struct StaticIdentityProvider {
    partitions: HashMap<String, String>,
}

impl StaticIdentityProvider {
    pub fn new(partitions: HashMap<String, String>) -> Self {
        Self { partitions }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn lookup_user(&self, identity: &str) -> Result<UserProfile, AuthError> {
        let mut private_metadata = Map::new();
        if let Some(partition) = self.partitions.get(identity) {
            private_metadata.insert(
                PARTITION_METADATA_KEY.to_string(),
                Value::String(partition.clone()),
            );
        }
        Ok(UserProfile {
            id: identity.to_string(),
            private_metadata,
        })
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
