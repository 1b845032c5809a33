//! Bearer credential parsing.
//!
//! The credential is a three-segment JWT-shaped token. Only the claims segment is
//! read here; signature checking is done upstream or by [`crate::auth::JwksVerifier`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use crate::auth::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the credential from an `Authorization` header value.
pub fn bearer_credential(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.map(str::trim).unwrap_or_default();
    // A bare scheme carries no token.
    if header.is_empty() || header.eq_ignore_ascii_case(BEARER_PREFIX.trim_end()) {
        return Err(AuthError::MissingCredential);
    }

    let scheme_len = BEARER_PREFIX.len();
    let is_bearer = header
        .get(..scheme_len)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(BEARER_PREFIX));
    if !is_bearer {
        return Err(AuthError::InvalidHeader);
    }

    let credential = header[scheme_len..].trim();
    if credential.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(credential)
}

/// Read the caller identity (`sub`) from a credential.
pub fn resolve_identity(credential: &str) -> Result<String, AuthError> {
    let segments: Vec<&str> = credential.split('.').collect();
    if segments.len() != 3 {
        return Err(AuthError::Malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    // base64url → standard alphabet, with the padding restored
    let mut claims = segments[1].replace('-', "+").replace('_', "/");
    while claims.len() % 4 != 0 {
        claims.push('=');
    }

    let decoded = STANDARD
        .decode(claims.as_bytes())
        .map_err(|e| AuthError::Malformed(format!("claims segment is not base64url: {}", e)))?;

    let claims: Value = serde_json::from_slice(&decoded)
        .map_err(|e| AuthError::Malformed(format!("claims segment is not JSON: {}", e)))?;

    match claims.get("sub").and_then(Value::as_str) {
        Some(sub) if !sub.is_empty() => Ok(sub.to_string()),
        _ => Err(AuthError::Malformed("missing sub claim".to_string())),
    }
}
