//! Source image download

use crate::error::FilterError;
use crate::resolve::{PrivateAddressRefused, PublicOnlyResolver};
use bytes::{Bytes, BytesMut};
use reqwest::Url;
use std::error::Error as _;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct SourceFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl SourceFetcher {
    /// Fetcher that connects to whatever the host resolves to
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, FilterError> {
        Self::build(Self::client_builder(timeout), max_bytes)
    }

    /// Fetcher whose connections only reach addresses `resolver` accepts
    pub fn public_only(
        timeout: Duration,
        max_bytes: usize,
        resolver: PublicOnlyResolver,
    ) -> Result<Self, FilterError> {
        let builder = Self::client_builder(timeout).dns_resolver(Arc::new(resolver));
        Self::build(builder, max_bytes)
    }

    fn client_builder(timeout: Duration) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(timeout)
            // Redirect targets would bypass the URL policy
            .redirect(reqwest::redirect::Policy::none())
    }

    fn build(builder: reqwest::ClientBuilder, max_bytes: usize) -> Result<Self, FilterError> {
        let client = builder
            .build()
            .map_err(|e| FilterError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, max_bytes })
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Download the whole body, refusing anything over `max_bytes`
    pub async fn fetch(&self, url: &Url) -> Result<Bytes, FilterError> {
        let start = std::time::Instant::now();

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FilterError::SourceFetch(format!(
                "source responded with HTTP {}",
                status.as_u16()
            )));
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes as u64 {
                return Err(FilterError::SourceTooLarge {
                    max_bytes: self.max_bytes,
                });
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FilterError::SourceFetch(e.without_url().to_string()))?
        {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(FilterError::SourceTooLarge {
                    max_bytes: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(
            size_bytes = body.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Source image fetched"
        );

        Ok(body.freeze())
    }
}

fn send_error(err: reqwest::Error) -> FilterError {
    let err = err.without_url();
    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(refused) = cause.downcast_ref::<PrivateAddressRefused>() {
            return FilterError::UrlNotAllowed(refused.to_string());
        }
        source = cause.source();
    }
    FilterError::SourceFetch(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::HostLookup;
    use async_trait::async_trait;
    use std::io;
    use std::net::SocketAddr;

    /// Answers every lookup with a fixed address
    struct FixedLookup(SocketAddr);

    #[async_trait]
    impl HostLookup for FixedLookup {
        async fn lookup(&self, _host: &str) -> io::Result<Vec<SocketAddr>> {
            Ok(vec![self.0])
        }
    }

    fn fetcher(max_bytes: usize) -> SourceFetcher {
        SourceFetcher::new(Duration::from_secs(5), max_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/a.png")
            .with_status(200)
            .with_body("image-bytes")
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/a.png", server.url())).unwrap();
        let body = fetcher(1024).fetch(&url).await.unwrap();

        assert_eq!(body.as_ref(), b"image-bytes");
    }

    #[tokio::test]
    async fn test_non_success_is_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/expired.png")
            .with_status(403)
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/expired.png", server.url())).unwrap();
        let err = fetcher(1024).fetch(&url).await.unwrap_err();

        assert!(matches!(err, FilterError::SourceFetch(msg) if msg.contains("403")));
    }

    #[tokio::test]
    async fn test_oversized_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/big.png")
            .with_status(200)
            .with_body(vec![0u8; 4096])
            .create_async()
            .await;

        let url = Url::parse(&format!("{}/big.png", server.url())).unwrap();
        let err = fetcher(1000).fetch(&url).await.unwrap_err();

        assert!(matches!(err, FilterError::SourceTooLarge { max_bytes: 1000 }));
    }

    #[tokio::test]
    async fn test_public_only_refuses_host_resolving_to_loopback() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/a.png")
            .with_status(200)
            .with_body("image-bytes")
            .expect(0)
            .create_async()
            .await;

        let loopback = server.socket_address();
        let resolver = PublicOnlyResolver::new(Arc::new(FixedLookup(loopback)));
        let fetcher =
            SourceFetcher::public_only(Duration::from_secs(5), 1024, resolver).unwrap();

        let url = Url::parse(&format!("http://rebind.test:{}/a.png", loopback.port())).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();

        assert!(matches!(
            err,
            FilterError::UrlNotAllowed(_) | FilterError::SourceFetch(_)
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_source() {
        // Nothing listens on the discard port
        let url = Url::parse("http://127.0.0.1:9/a.png").unwrap();
        let err = fetcher(1024).fetch(&url).await.unwrap_err();

        assert!(matches!(err, FilterError::SourceFetch(_)));
    }
}
