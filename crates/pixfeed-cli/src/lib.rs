//! Output and exit-code conventions for the `pixfeed` command.

use chrono::{DateTime, Utc};
use pixfeed_core::{ErrorMetadata, FinalRef, RelayError, SignedUrl};
use serde::Serialize;

/// A signed URL as printed on stdout
#[derive(Debug, Serialize)]
pub struct SignedUrlOutput {
    pub key: String,
    pub direction: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&SignedUrl> for SignedUrlOutput {
    fn from(url: &SignedUrl) -> Self {
        Self {
            key: url.key().to_string(),
            direction: url.direction().to_string(),
            url: url.as_str().to_string(),
            expires_at: url.expires_at(),
        }
    }
}

/// Result of `pixfeed process`
#[derive(Debug, Serialize)]
pub struct ProcessOutput {
    pub transformed: bool,
    #[serde(flatten)]
    pub final_url: SignedUrlOutput,
}

impl From<&FinalRef> for ProcessOutput {
    fn from(final_ref: &FinalRef) -> Self {
        Self {
            transformed: final_ref.transformed(),
            final_url: SignedUrlOutput::from(final_ref.url()),
        }
    }
}

/// Printed on stderr when a relay call fails
#[derive(Debug, Serialize)]
pub struct FailureOutput {
    pub error: String,
    pub code: &'static str,
    pub recoverable: bool,
}

impl From<&RelayError> for FailureOutput {
    fn from(err: &RelayError) -> Self {
        Self {
            error: err.to_string(),
            code: err.error_code(),
            recoverable: err.is_recoverable(),
        }
    }
}

/// Process exit status for a relay failure
pub fn exit_code(err: &RelayError) -> i32 {
    match err {
        RelayError::InvalidKey(_) => 2,
        RelayError::UpstreamUnreachable(_) | RelayError::UpstreamError { .. } => 3,
        RelayError::UploadFailed(_) => 4,
        RelayError::SigningFailed(_) => 5,
        RelayError::Cancelled => 130,
    }
}

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}
