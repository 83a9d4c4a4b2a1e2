use crate::traits::{SignedUrlProvider, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use pixfeed_core::models::Direction;
use pixfeed_core::{ObjectKey, SignedUrl};
use sha2::Sha256;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

type HmacSha256 = Hmac<Sha256>;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// HMAC-signed URLs for objects served by the API's `/media` routes
#[derive(Clone)]
pub struct LocalUrlSigner {
    base_url: String,
    signing_key: Vec<u8>,
    expires_in: Duration,
}

impl LocalUrlSigner {
    /// # Arguments
    /// * `base_url` - Public URL the media routes are mounted at
    ///   (e.g., "http://localhost:8080/media")
    /// * `signing_key` - Shared secret, at least 32 bytes
    /// * `expires_in` - Lifetime of every URL this signer mints
    pub fn new(base_url: String, signing_key: &str, expires_in: Duration) -> StorageResult<Self> {
        if signing_key.len() < 32 {
            return Err(StorageError::ConfigError(
                "LOCAL_SIGNING_KEY must be at least 32 characters".to_string(),
            ));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            signing_key: signing_key.as_bytes().to_vec(),
            expires_in,
        })
    }

    fn mac(&self, direction: Direction, key: &ObjectKey, expires: i64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_key)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;
        mac.update(direction.http_method().as_bytes());
        mac.update(b"\n");
        mac.update(key.as_str().as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    fn encoded_path(key: &ObjectKey) -> String {
        key.as_str()
            .split('/')
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Sign a URL that expires at `expires_at` (second precision)
    pub fn sign_at(
        &self,
        key: &ObjectKey,
        direction: Direction,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<SignedUrl> {
        let expires = expires_at.timestamp();
        let signature = hex::encode(self.mac(direction, key, expires)?.finalize().into_bytes());

        let url = format!(
            "{}/{}?method={}&expires={}&signature={}",
            self.base_url,
            Self::encoded_path(key),
            direction.http_method(),
            expires,
            signature
        );

        Ok(SignedUrl::new(key.clone(), direction, url, expires_at))
    }

    /// Check a presented signature for `{direction, key, expires}`.
    ///
    /// Rejects expired URLs before comparing; the comparison itself is
    /// constant-time.
    pub fn verify(
        &self,
        direction: Direction,
        key: &ObjectKey,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<()> {
        if now.timestamp() >= expires {
            return Err(StorageError::InvalidSignature("URL has expired".to_string()));
        }

        let presented = hex::decode(signature)
            .map_err(|_| StorageError::InvalidSignature("malformed signature".to_string()))?;

        self.mac(direction, key, expires)?
            .verify_slice(&presented)
            .map_err(|_| StorageError::InvalidSignature("signature mismatch".to_string()))
    }

    fn expires_at(&self) -> StorageResult<DateTime<Utc>> {
        let lifetime = chrono::Duration::from_std(self.expires_in)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        Ok(Utc::now() + lifetime)
    }
}

#[async_trait]
impl SignedUrlProvider for LocalUrlSigner {
    async fn for_read(&self, key: &ObjectKey) -> StorageResult<SignedUrl> {
        self.sign_at(key, Direction::Read, self.expires_at()?)
    }

    async fn for_write(&self, key: &ObjectKey) -> StorageResult<SignedUrl> {
        self.sign_at(key, Direction::Write, self.expires_at()?)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Filesystem object store behind the local backend.
///
/// Object bytes live under `{root}/objects/{key}` and the content type under
/// `{root}/meta/{key}`. Every file is written to a temporary sibling and
/// renamed into place.
#[derive(Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();

        for dir in ["objects", "meta"] {
            fs::create_dir_all(root.join(dir)).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {}: {}",
                    root.join(dir).display(),
                    e
                ))
            })?;
        }

        Ok(Self { root })
    }

    fn object_path(&self, key: &ObjectKey) -> PathBuf {
        self.root.join("objects").join(key.as_str())
    }

    fn meta_path(&self, key: &ObjectKey) -> PathBuf {
        self.root.join("meta").join(key.as_str())
    }

    /// Object bytes and the content type they were written with
    pub async fn read(&self, key: &ObjectKey) -> StorageResult<(Bytes, String)> {
        let start = std::time::Instant::now();

        let data = match fs::read(self.object_path(key)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let content_type = match fs::read_to_string(self.meta_path(key)).await {
            Ok(ct) if !ct.trim().is_empty() => ct.trim().to_string(),
            _ => DEFAULT_CONTENT_TYPE.to_string(),
        };

        tracing::debug!(
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read"
        );

        Ok((Bytes::from(data), content_type))
    }

    /// Replace the object at `key`
    pub async fn write(&self, key: &ObjectKey, body: Bytes, content_type: &str) -> StorageResult<()> {
        let object_path = self.object_path(key);
        let meta_path = self.meta_path(key);
        let content_type = content_type.to_string();
        let size = body.len();
        let start = std::time::Instant::now();

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            write_atomic(&object_path, &body)?;
            write_atomic(&meta_path, content_type.as_bytes())
        })
        .await
        .map_err(|e| StorageError::UploadFailed(format!("write task failed: {}", e)))?
        .map_err(|e| StorageError::UploadFailed(format!("Failed to write {}: {}", key, e)))?;

        tracing::info!(
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(())
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
