use crate::traits::{SignedUrlProvider, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::Utc;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use pixfeed_core::models::Direction;
use pixfeed_core::{ObjectKey, SignedUrl};
use std::time::Duration;

/// S3 presigned URL provider
#[derive(Clone)]
pub struct S3UrlSigner {
    store: AmazonS3,
    bucket: String,
    expires_in: Duration,
}

impl S3UrlSigner {
    /// Create a new S3UrlSigner with credentials taken from the environment
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `expires_in` - Lifetime of every URL this signer mints
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        expires_in: Duration,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        Self::from_builder(builder, bucket, expires_in)
    }

    /// Build from a preconfigured builder (explicit credentials, tests)
    pub fn from_builder(
        builder: AmazonS3Builder,
        bucket: String,
        expires_in: Duration,
    ) -> StorageResult<Self> {
        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3UrlSigner {
            store,
            bucket,
            expires_in,
        })
    }

    #[tracing::instrument(skip_all, fields(
        aws.service.name = "s3",
        aws.s3.bucket = %self.bucket,
        aws.s3.key = %key,
        direction = %direction
    ))]
    async fn sign(&self, key: &ObjectKey, direction: Direction) -> StorageResult<SignedUrl> {
        let method = match direction {
            Direction::Read => Method::GET,
            Direction::Write => Method::PUT,
        };
        let location = object_path(key)?;
        let issued_at = Utc::now();

        let url = self
            .store
            .signed_url(method, &location, self.expires_in)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "S3 URL signing failed");
                StorageError::SigningFailed(e.to_string())
            })?;

        let expires_at = issued_at
            + chrono::Duration::from_std(self.expires_in)
                .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        tracing::debug!(expires_at = %expires_at, "S3 URL signed");

        Ok(SignedUrl::new(key.clone(), direction, url.to_string(), expires_at))
    }
}

/// Store path for `key`, byte for byte. `Path::from` would percent-encode
/// `%`, `#` and braces inside a segment and sign a different object.
fn object_path(key: &ObjectKey) -> StorageResult<Path> {
    Path::parse(key.as_str()).map_err(|e| StorageError::InvalidKey(e.to_string()))
}

#[async_trait]
impl SignedUrlProvider for S3UrlSigner {
    async fn for_read(&self, key: &ObjectKey) -> StorageResult<SignedUrl> {
        self.sign(key, Direction::Read).await
    }

    async fn for_write(&self, key: &ObjectKey) -> StorageResult<SignedUrl> {
        self.sign(key, Direction::Write).await
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> S3UrlSigner {
        let builder = AmazonS3Builder::new()
            .with_bucket_name("feed-bucket")
            .with_region("us-east-1")
            .with_access_key_id("AKIDEXAMPLE")
            .with_secret_access_key("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY");
        S3UrlSigner::from_builder(builder, "feed-bucket".to_string(), Duration::from_secs(300))
            .unwrap()
    }

    #[tokio::test]
    async fn test_read_url_contains_key_and_signature() {
        let key = ObjectKey::parse("raw/42.jpg").unwrap();
        let url = signer().for_read(&key).await.unwrap();

        assert_eq!(url.direction(), Direction::Read);
        assert_eq!(url.key(), &key);
        assert!(url.as_str().contains("raw/42.jpg"));
        assert!(url.as_str().contains("feed-bucket"));
        assert!(url.as_str().contains("X-Amz-Signature="));
        assert!(url.as_str().contains("X-Amz-Expires=300"));
        assert!(!url.is_expired_at(Utc::now()));
    }

    #[tokio::test]
    async fn test_read_and_write_urls_differ() {
        let key = ObjectKey::parse("raw/42.jpg").unwrap();
        let signer = signer();
        let read = signer.for_read(&key).await.unwrap();
        let write = signer.for_write(&key).await.unwrap();

        assert_eq!(write.direction(), Direction::Write);
        assert_eq!(read.redacted(), write.redacted());
        assert_ne!(read.as_str(), write.as_str());
    }

    const RESERVED_KEYS: [&str; 5] = [
        "raw/42.jpg",
        "raw/a%b.jpg",
        "raw/{x}.jpg",
        "raw/a#1.jpg",
        "raw/100%{final}#2.png",
    ];

    #[test]
    fn test_object_path_keeps_key_verbatim() {
        for raw in RESERVED_KEYS {
            let key = ObjectKey::parse(raw).unwrap();
            let path = object_path(&key).unwrap();
            assert_eq!(path.as_ref(), raw, "path for {}", raw);
        }
    }

    #[tokio::test]
    async fn test_signed_url_addresses_key_verbatim() {
        let signer = signer();
        for raw in RESERVED_KEYS {
            let key = ObjectKey::parse(raw).unwrap();
            let url = signer.for_read(&key).await.unwrap();

            let path = url.as_str().split('?').next().unwrap();
            let decoded = urlencoding::decode(path).unwrap();
            assert!(
                decoded.ends_with(&format!("/{}", raw)),
                "{} signed as {}",
                raw,
                path
            );
        }
    }

    #[test]
    fn test_backend_type() {
        assert_eq!(signer().backend_type(), StorageBackend::S3);
    }
}
