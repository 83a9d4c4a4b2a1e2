//! Transform service errors

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pixfeed_core::{ErrorMetadata, LogLevel};
use pixfeed_infra::ErrorResponse;
use pixfeed_processing::ProcessingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    /// `image_url` absent, empty or not an http(s) URL
    #[error("Invalid image_url: {0}")]
    InvalidUrl(String),

    /// URL is well formed but points somewhere we refuse to fetch
    #[error("image_url not allowed: {0}")]
    UrlNotAllowed(String),

    #[error("Failed to fetch source image: {0}")]
    SourceFetch(String),

    #[error("Source image is larger than {max_bytes} bytes")]
    SourceTooLarge { max_bytes: usize },

    #[error("Source is not a supported image: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ProcessingError> for FilterError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::Decode(msg) => FilterError::Decode(msg),
            other => FilterError::Internal(other.to_string()),
        }
    }
}

impl FilterError {
    pub fn error_type(&self) -> &'static str {
        match self {
            FilterError::InvalidUrl(_) => "InvalidUrl",
            FilterError::UrlNotAllowed(_) => "UrlNotAllowed",
            FilterError::SourceFetch(_) => "SourceFetch",
            FilterError::SourceTooLarge { .. } => "SourceTooLarge",
            FilterError::Decode(_) => "Decode",
            FilterError::Internal(_) => "Internal",
        }
    }
}

impl ErrorMetadata for FilterError {
    fn http_status_code(&self) -> u16 {
        match self {
            FilterError::InvalidUrl(_) | FilterError::UrlNotAllowed(_) => 400,
            FilterError::Decode(_) | FilterError::SourceTooLarge { .. } => 422,
            FilterError::SourceFetch(_) => 502,
            FilterError::Internal(_) => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            FilterError::InvalidUrl(_) => "INVALID_URL",
            FilterError::UrlNotAllowed(_) => "URL_NOT_ALLOWED",
            FilterError::SourceFetch(_) => "SOURCE_FETCH_FAILED",
            FilterError::SourceTooLarge { .. } => "SOURCE_TOO_LARGE",
            FilterError::Decode(_) => "UNSUPPORTED_IMAGE",
            FilterError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, FilterError::SourceFetch(_))
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            FilterError::InvalidUrl(_) => {
                Some("Pass an http(s) URL: /filteredimage?image_url={URL}")
            }
            FilterError::SourceFetch(_) => Some("Check that the source URL is reachable and not expired"),
            FilterError::Decode(_) => Some("Use a JPEG, PNG, WebP or GIF source image"),
            _ => None,
        }
    }

    fn client_message(&self) -> String {
        match self {
            FilterError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn is_sensitive(&self) -> bool {
        matches!(self, FilterError::Internal(_))
    }

    fn log_level(&self) -> LogLevel {
        match self {
            FilterError::InvalidUrl(_)
            | FilterError::UrlNotAllowed(_)
            | FilterError::SourceTooLarge { .. }
            | FilterError::Decode(_) => LogLevel::Debug,
            FilterError::SourceFetch(_) => LogLevel::Warn,
            FilterError::Internal(_) => LogLevel::Error,
        }
    }
}

impl IntoResponse for FilterError {
    fn into_response(self) -> Response {
        let error_type = self.error_type();
        match self.log_level() {
            LogLevel::Debug => tracing::debug!(error = %self, error_type, "Filter request failed"),
            LogLevel::Warn => tracing::warn!(error = %self, error_type, "Filter request failed"),
            LogLevel::Error => tracing::error!(error = %self, error_type, "Filter request failed"),
        }

        let status =
            StatusCode::from_u16(self.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse::full(
            self.client_message(),
            self.error_code(),
            self.is_recoverable(),
            self.suggested_action(),
        );

        (status, Json(body)).into_response()
    }
}
