#[cfg(feature = "storage-local")]
use crate::{LocalObjectStore, LocalUrlSigner};
#[cfg(feature = "storage-s3")]
use crate::S3UrlSigner;
use crate::{SignedUrlProvider, StorageBackend, StorageError, StorageResult};
use pixfeed_core::Config;
use std::sync::Arc;

/// Create the signed URL provider for the configured backend
pub fn create_signer(config: &Config) -> StorageResult<Arc<dyn SignedUrlProvider>> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let signer = S3UrlSigner::new(bucket, region, endpoint, config.signed_url_expiry())?;
            Ok(Arc::new(signer))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => Ok(Arc::new(local_signer(config)?)),

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Signer and filesystem root the API needs to serve `/media` itself
#[cfg(feature = "storage-local")]
#[derive(Clone)]
pub struct LocalMedia {
    pub signer: Arc<LocalUrlSigner>,
    pub store: LocalObjectStore,
}

/// `Some` only when the local backend is configured
#[cfg(feature = "storage-local")]
pub async fn create_local_media(config: &Config) -> StorageResult<Option<LocalMedia>> {
    if config.storage_backend() != StorageBackend::Local {
        return Ok(None);
    }

    let path = config.local_storage_path().ok_or_else(|| {
        StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
    })?;

    Ok(Some(LocalMedia {
        signer: Arc::new(local_signer(config)?),
        store: LocalObjectStore::new(path).await?,
    }))
}

#[cfg(feature = "storage-local")]
fn local_signer(config: &Config) -> StorageResult<LocalUrlSigner> {
    let base_url = config.local_storage_base_url().map(String::from).ok_or_else(|| {
        StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
    })?;
    let signing_key = config.local_signing_key().ok_or_else(|| {
        StorageError::ConfigError("LOCAL_SIGNING_KEY not configured".to_string())
    })?;

    LocalUrlSigner::new(base_url, signing_key, config.signed_url_expiry())
}
