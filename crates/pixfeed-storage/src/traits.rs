//! Storage abstraction traits
//!
//! The relay never talks to the bucket API directly: it mints signed URLs
//! through a `SignedUrlProvider` and writes through an `ObjectUploader` that
//! PUTs to such a URL.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use pixfeed_core::{ObjectKey, RelayError, SignedUrl};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for RelayError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(msg) => RelayError::InvalidKey(msg),
            StorageError::SigningFailed(msg)
            | StorageError::InvalidSignature(msg)
            | StorageError::ConfigError(msg) => RelayError::SigningFailed(msg),
            StorageError::UploadFailed(msg) | StorageError::NotFound(msg) => {
                RelayError::UploadFailed(msg)
            }
            StorageError::IoError(e) => RelayError::UploadFailed(e.to_string()),
        }
    }
}

/// Mints time-limited URLs for a single object.
///
/// Implementations hold no per-call state and are safe to share between
/// concurrent relay invocations. Signing is local computation except when the
/// credential provider itself has to refresh remotely.
#[async_trait]
pub trait SignedUrlProvider: Send + Sync {
    /// URL that returns the bytes last written under `key` (HTTP GET)
    async fn for_read(&self, key: &ObjectKey) -> StorageResult<SignedUrl>;

    /// URL whose single PUT atomically replaces the object at `key`
    async fn for_write(&self, key: &ObjectKey) -> StorageResult<SignedUrl>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Writes a complete object through a signed write URL.
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    /// One PUT of the whole body with `content-type` set verbatim.
    ///
    /// Never splits the body into parts: the object is either untouched or
    /// fully replaced.
    async fn put(&self, target: &SignedUrl, body: Bytes, content_type: &str)
        -> StorageResult<()>;
}
