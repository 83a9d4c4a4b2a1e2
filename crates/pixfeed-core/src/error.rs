//! Error types module
//!
//! `RelayError` is the closed failure taxonomy of the transform relay: every
//! failed `process` call yields exactly one variant. `AppError` wraps it for the
//! boundary layers (HTTP, CLI) together with the few errors those layers raise
//! themselves (bad input, missing feed rows).

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like an unreachable upstream
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UPLOAD_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried by the caller)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failure of a single relay invocation.
///
/// None of these are retried inside the relay; retry policy belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Empty or malformed object key. Raised before any collaborator is called.
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// The transform service could not be reached or did not answer in time.
    #[error("Transform service unreachable: {0}")]
    UpstreamUnreachable(String),

    /// The transform service answered, but not with a usable image.
    #[error("Transform service error (status {status}): {message}")]
    UpstreamError { status: u16, message: String },

    /// Storage credentials could not mint a signed URL.
    #[error("Failed to sign storage URL: {0}")]
    SigningFailed(String),

    /// The PUT to the signed write URL failed or timed out.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// The caller aborted the operation before it completed.
    #[error("Operation cancelled")]
    Cancelled,
}

impl RelayError {
    /// Variant name used in logs and detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            RelayError::InvalidKey(_) => "InvalidKey",
            RelayError::UpstreamUnreachable(_) => "UpstreamUnreachable",
            RelayError::UpstreamError { .. } => "UpstreamError",
            RelayError::SigningFailed(_) => "SigningFailed",
            RelayError::UploadFailed(_) => "UploadFailed",
            RelayError::Cancelled => "Cancelled",
        }
    }
}

impl ErrorMetadata for RelayError {
    fn http_status_code(&self) -> u16 {
        match self {
            RelayError::InvalidKey(_) => 400,
            RelayError::UpstreamUnreachable(_) => 503,
            RelayError::UpstreamError { .. } => 502,
            RelayError::SigningFailed(_) => 500,
            RelayError::UploadFailed(_) => 502,
            RelayError::Cancelled => 499,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RelayError::InvalidKey(_) => "INVALID_KEY",
            RelayError::UpstreamUnreachable(_) => "TRANSFORM_UNREACHABLE",
            RelayError::UpstreamError { .. } => "TRANSFORM_FAILED",
            RelayError::SigningFailed(_) => "SIGNING_FAILED",
            RelayError::UploadFailed(_) => "UPLOAD_FAILED",
            RelayError::Cancelled => "CANCELLED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RelayError::UpstreamUnreachable(_) | RelayError::UploadFailed(_)
        )
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            RelayError::InvalidKey(_) => Some("Check the object key and try again"),
            RelayError::UpstreamUnreachable(_) => Some("Retry after a short delay"),
            RelayError::UpstreamError { .. } => {
                Some("Check that the source object is a supported image")
            }
            RelayError::SigningFailed(_) => Some("Contact support if this error persists"),
            RelayError::UploadFailed(_) => Some("Retry after a short delay"),
            RelayError::Cancelled => None,
        }
    }

    fn client_message(&self) -> String {
        match self {
            RelayError::InvalidKey(msg) => format!("Invalid object key: {}", msg),
            RelayError::UpstreamUnreachable(_) => {
                "Image transform service is unavailable".to_string()
            }
            RelayError::UpstreamError { status, .. } => {
                format!("Image transform failed (upstream status {})", status)
            }
            RelayError::SigningFailed(_) => "Storage is misconfigured".to_string(),
            RelayError::UploadFailed(_) => "Failed to store the transformed image".to_string(),
            RelayError::Cancelled => "Request cancelled".to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        matches!(
            self,
            RelayError::SigningFailed(_) | RelayError::UploadFailed(_)
        )
    }

    fn log_level(&self) -> LogLevel {
        match self {
            RelayError::InvalidKey(_) | RelayError::Cancelled => LogLevel::Debug,
            RelayError::UpstreamUnreachable(_) | RelayError::UpstreamError { .. } => {
                LogLevel::Warn
            }
            RelayError::SigningFailed(_) | RelayError::UploadFailed(_) => LogLevel::Error,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("Storage error: {0}")]
    Storage(String),

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

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for the variants that do not delegate:
/// (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            false,
            Some("Request a new signed URL"),
            false,
            LogLevel::Warn,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        // Delegated in the trait impl below
        AppError::Relay(_) => (500, "INTERNAL_ERROR", false, None, true, LogLevel::Error),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::NotFound(_) => "NotFound",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Relay(inner) => inner.error_type(),
            AppError::Storage(_) => "Storage",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Full message including the source chain, for non-production responses
    pub fn detailed_message(&self) -> String {
        match self {
            AppError::InternalWithSource { message, source } => {
                format!("{}: {:#}", message, source)
            }
            other => other.to_string(),
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            AppError::Relay(inner) => inner.http_status_code(),
            other => app_error_static_metadata(other).0,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Relay(inner) => inner.error_code(),
            other => app_error_static_metadata(other).1,
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            AppError::Relay(inner) => inner.is_recoverable(),
            other => app_error_static_metadata(other).2,
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Relay(inner) => inner.suggested_action(),
            other => app_error_static_metadata(other).3,
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::Relay(inner) => inner.client_message(),
            AppError::Storage(_) => "A storage error occurred".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "An internal error occurred".to_string()
            }
        }
    }

    fn is_sensitive(&self) -> bool {
        match self {
            AppError::Relay(inner) => inner.is_sensitive(),
            other => app_error_static_metadata(other).4,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::Relay(inner) => inner.log_level(),
            other => app_error_static_metadata(other).5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_error_status_codes() {
        assert_eq!(
            RelayError::InvalidKey("key is empty".into()).http_status_code(),
            400
        );
        assert_eq!(
            RelayError::UpstreamUnreachable("connect refused".into()).http_status_code(),
            503
        );
        assert_eq!(
            RelayError::UpstreamError {
                status: 500,
                message: "boom".into()
            }
            .http_status_code(),
            502
        );
        assert_eq!(
            RelayError::UploadFailed("403".into()).http_status_code(),
            502
        );
        assert_eq!(
            RelayError::SigningFailed("no credentials".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_relay_error_recoverability() {
        assert!(RelayError::UpstreamUnreachable("timeout".into()).is_recoverable());
        assert!(RelayError::UploadFailed("timeout".into()).is_recoverable());
        assert!(!RelayError::InvalidKey("".into()).is_recoverable());
        assert!(!RelayError::UpstreamError {
            status: 400,
            message: "bad image".into()
        }
        .is_recoverable());
    }

    #[test]
    fn test_upstream_client_message_hides_body() {
        let err = RelayError::UpstreamError {
            status: 500,
            message: "stack trace from upstream".into(),
        };
        let msg = err.client_message();
        assert!(msg.contains("500"));
        assert!(!msg.contains("stack trace"));
    }

    #[test]
    fn test_app_error_delegates_to_relay_error() {
        let app: AppError = RelayError::UploadFailed("503 from bucket".into()).into();
        assert_eq!(app.http_status_code(), 502);
        assert_eq!(app.error_code(), "UPLOAD_FAILED");
        assert_eq!(app.error_type(), "UploadFailed");
        assert!(app.is_sensitive());
        assert_eq!(app.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_app_error_static_metadata() {
        let err = AppError::NotFound("Feed item 7 not found".into());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.client_message(), "Feed item 7 not found");
        assert!(!err.is_sensitive());

        let err = AppError::Internal("disk on fire".into());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.client_message(), "An internal error occurred");
        assert!(err.is_sensitive());
    }

    #[test]
    fn test_detailed_message_includes_source() {
        let err: AppError = anyhow::anyhow!("inner cause")
            .context("outer context")
            .into();
        assert!(err.detailed_message().contains("inner cause"));
    }
}
