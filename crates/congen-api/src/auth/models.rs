use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use congen_core::AppError;

use crate::error::HttpAppError;

/// Authenticated caller, stored in request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// Stable identity (`sub`); also the dispatch routing key.
    pub identity: String,
    /// Partition every storage operation of this request is scoped to.
    pub partition: String,
    /// Raw bearer credential, forwarded to workers as the job's access token.
    pub credential: String,
}

// Extracted from parts rather than `Extension` so it can precede `Multipart`.
impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerContext>()
            .cloned()
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing caller context".to_string(),
                ))
            })
    }
}
