use crate::traits::{ObjectUploader, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use pixfeed_core::models::Direction;
use pixfeed_core::SignedUrl;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Uploads a whole object with one HTTP PUT to a signed write URL
#[derive(Clone)]
pub struct HttpUploader {
    client: reqwest::Client,
}

impl HttpUploader {
    pub fn new(timeout: Duration) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectUploader for HttpUploader {
    #[tracing::instrument(skip_all, fields(
        key = %target.key(),
        url = %target.redacted(),
        content_type = %content_type,
        size_bytes = body.len()
    ))]
    async fn put(&self, target: &SignedUrl, body: Bytes, content_type: &str) -> StorageResult<()> {
        if target.direction() != Direction::Write {
            return Err(StorageError::UploadFailed(
                "signed URL was not minted for writing".to_string(),
            ));
        }

        let start = std::time::Instant::now();

        let response = self
            .client
            .put(target.as_str())
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                // reqwest errors embed the full URL, signature included
                let e = e.without_url();
                if e.is_timeout() {
                    StorageError::UploadFailed("upload timed out".to_string())
                } else {
                    StorageError::UploadFailed(format!("upload request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Storage rejected upload");
            return Err(StorageError::UploadFailed(format!(
                "storage responded with status {}",
                status.as_u16()
            )));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload successful"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mockito::Matcher;
    use pixfeed_core::ObjectKey;

    fn target(base: &str, direction: Direction) -> SignedUrl {
        SignedUrl::new(
            ObjectKey::parse("raw/42.jpg").unwrap(),
            direction,
            format!("{}/raw/42.jpg?X-Amz-Signature=abc", base),
            Utc::now() + chrono::Duration::minutes(5),
        )
    }

    #[tokio::test]
    async fn test_put_sends_body_and_content_type_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/raw/42.jpg")
            .match_query(Matcher::UrlEncoded("X-Amz-Signature".into(), "abc".into()))
            .match_header("content-type", "image/webp")
            .match_body("transformed-bytes")
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let uploader = HttpUploader::new(Duration::from_secs(5)).unwrap();
        uploader
            .put(
                &target(&server.url(), Direction::Write),
                Bytes::from_static(b"transformed-bytes"),
                "image/webp",
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_non_success_is_upload_failed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/raw/42.jpg")
            .match_query(Matcher::Any)
            .with_status(403)
            .expect(1)
            .create_async()
            .await;

        let uploader = HttpUploader::new(Duration::from_secs(5)).unwrap();
        let err = uploader
            .put(
                &target(&server.url(), Direction::Write),
                Bytes::from_static(b"x"),
                "image/jpeg",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::UploadFailed(ref msg) if msg.contains("403")));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_rejects_read_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let uploader = HttpUploader::new(Duration::from_secs(5)).unwrap();
        let result = uploader
            .put(
                &target(&server.url(), Direction::Read),
                Bytes::from_static(b"x"),
                "image/jpeg",
            )
            .await;

        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_error_does_not_leak_signature() {
        let uploader = HttpUploader::new(Duration::from_secs(2)).unwrap();
        let err = uploader
            .put(
                &target("http://127.0.0.1:1", Direction::Write),
                Bytes::from_static(b"x"),
                "image/jpeg",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::UploadFailed(_)));
        assert!(!err.to_string().contains("X-Amz-Signature"));
    }
}
