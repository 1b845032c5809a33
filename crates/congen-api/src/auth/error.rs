use congen_core::AppError;
use thiserror::Error;

pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "Could not authenticate. Please provide an Authorization token.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingCredential,

    #[error("Invalid authorization header format")]
    InvalidHeader,

    #[error("Malformed credential: {0}")]
    Malformed(String),

    #[error("Credential rejected: {0}")]
    InvalidSignature(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("No partition assigned to {0}")]
    NoPartition(String),

    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Identity provider timed out: {0}")]
    Timeout(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential => {
                AppError::Unauthorized(MISSING_CREDENTIAL_MESSAGE.to_string())
            }
            AuthError::InvalidHeader => AppError::Unauthorized(
                "Could not authenticate. Authorization header must use the Bearer scheme."
                    .to_string(),
            ),
            AuthError::Malformed(_) | AuthError::InvalidSignature(_) => AppError::Unauthorized(
                "Could not authenticate. Invalid Authorization token.".to_string(),
            ),
            AuthError::UnknownUser(_) => {
                AppError::Unauthorized("Could not authenticate. Unknown account.".to_string())
            }
            AuthError::NoPartition(identity) => AppError::NoPartition(identity),
            AuthError::Provider(msg) => AppError::IdentityProvider(msg),
            AuthError::Timeout(msg) => AppError::Timeout(msg),
        }
    }
}
