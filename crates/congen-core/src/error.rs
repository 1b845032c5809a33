//! Error types module
//!
//! All failures that reach the request boundary are unified under [`AppError`].
//! Component crates keep their own error enums (storage, bus, identity) and convert
//! into `AppError` where the orchestrator catches them. [`ErrorMetadata`] describes how
//! each variant is presented to the caller: HTTP status, taxonomy code, client message.

use crate::models::ErrorCode;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for tenant configuration faults
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Taxonomy entry carried in the response envelope's `errorCode`
    fn error_code(&self) -> ErrorCode;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details must be hidden from the caller
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("No partition assigned: {0}")]
    NoPartition(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Message bus error: {0}")]
    Bus(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, ErrorCode, bool, LogLevel) {
    match err {
        AppError::Unauthorized(_) => (401, ErrorCode::Unauthorized, false, LogLevel::Debug),
        // A tenant without a partition is an account configuration fault, not a transient error.
        AppError::NoPartition(_) => (401, ErrorCode::Unauthorized, false, LogLevel::Warn),
        AppError::BadRequest(_) => (400, ErrorCode::BadRequest, false, LogLevel::Debug),
        AppError::FileNotFound(_) => (404, ErrorCode::FileNotFound, false, LogLevel::Debug),
        // The envelope taxonomy has no size entry; the HTTP status carries it.
        AppError::PayloadTooLarge(_) => (413, ErrorCode::BadRequest, false, LogLevel::Debug),
        AppError::Storage(_) => (500, ErrorCode::InternalError, true, LogLevel::Error),
        AppError::Bus(_) => (500, ErrorCode::InternalError, true, LogLevel::Error),
        AppError::IdentityProvider(_) => (500, ErrorCode::InternalError, true, LogLevel::Error),
        AppError::Timeout(_) => (500, ErrorCode::InternalError, true, LogLevel::Error),
        AppError::Internal(_) => (500, ErrorCode::InternalError, true, LogLevel::Error),
        AppError::InternalWithSource { .. } => {
            (500, ErrorCode::InternalError, true, LogLevel::Error)
        }
    }
}

impl AppError {
    /// Get the error type name for logs
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::NoPartition(_) => "NoPartition",
            AppError::BadRequest(_) => "BadRequest",
            AppError::FileNotFound(_) => "FileNotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Storage(_) => "Storage",
            AppError::Bus(_) => "Bus",
            AppError::IdentityProvider(_) => "IdentityProvider",
            AppError::Timeout(_) => "Timeout",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> ErrorCode {
        app_error_static_metadata(self).1
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::NoPartition(_) => "This account does not have a 'container' value assigned in private metadata. Please resolve and try again".to_string(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::FileNotFound(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Bus(_) => "Failed to dispatch generation request".to_string(),
            AppError::IdentityProvider(_) => "Failed to resolve account".to_string(),
            AppError::Timeout(_) => "Upstream service timed out".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
