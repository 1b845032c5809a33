use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{bearer_credential, AuthError, IdentityService};
use crate::error::HttpAppError;

/// Resolve the caller before any handler work. Rejections never reach storage or the bus.
pub async fn auth_middleware(
    State(identity): State<Arc<IdentityService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = match request.headers().get(AUTHORIZATION) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(value) => Some(value),
            Err(_) => return HttpAppError::from(AuthError::InvalidHeader).into_response(),
        },
    };

    let credential = match bearer_credential(header) {
        Ok(credential) => credential.to_string(),
        Err(e) => return HttpAppError::from(e).into_response(),
    };

    match identity.resolve(&credential).await {
        Ok(caller) => {
            tracing::debug!(
                identity = %caller.identity,
                partition = %caller.partition,
                "Caller authenticated"
            );
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Err(e) => HttpAppError::from(e).into_response(),
    }
}
