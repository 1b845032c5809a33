//! Caller authentication: bearer credential → identity → partition.

pub mod credential;
pub mod error;
pub mod jwks;
pub mod middleware;
pub mod models;
pub mod provider;
pub mod service;

pub use credential::{bearer_credential, resolve_identity};
pub use error::AuthError;
pub use jwks::JwksVerifier;
pub use middleware::auth_middleware;
pub use models::CallerContext;
pub use provider::{ClerkIdentityProvider, IdentityProvider, StaticIdentityProvider, UserProfile};
pub use service::IdentityService;
