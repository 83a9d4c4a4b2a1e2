//! Client for the external transform service.

use async_trait::async_trait;
use pixfeed_core::{RelayError, SignedUrl, TransformResult};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Path of the transform endpoint under the configured base URL
pub const TRANSFORM_PATH: &str = "/filteredimage";

/// Query parameter carrying the source URL
pub const SOURCE_URL_PARAM: &str = "image_url";

const MAX_ERROR_BODY_CHARS: usize = 200;

/// Enough bytes for `MAX_ERROR_BODY_CHARS` of any UTF-8 text
const MAX_ERROR_BODY_BYTES: usize = MAX_ERROR_BODY_CHARS * 4;

/// Turns a readable source URL into transformed bytes.
///
/// One call, no retries. Implementations must return the service's
/// `content-type` verbatim.
#[async_trait]
pub trait TransformClient: Send + Sync {
    async fn transform(&self, source: &SignedUrl) -> Result<TransformResult, RelayError>;
}

/// `GET {base}/filteredimage?image_url={source}` over reqwest
#[derive(Clone)]
pub struct HttpTransformClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransformClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), TRANSFORM_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn unreachable(err: reqwest::Error) -> RelayError {
    // The request URL embeds the signed source URL
    let err = err.without_url();
    if err.is_timeout() {
        RelayError::UpstreamUnreachable("transform service timed out".to_string())
    } else {
        RelayError::UpstreamUnreachable(err.to_string())
    }
}

/// First `MAX_ERROR_BODY_CHARS` characters of an error body. Stops reading
/// once enough bytes are buffered; the rest of the body is dropped.
async fn error_excerpt(mut response: reqwest::Response) -> String {
    let mut buffered: Vec<u8> = Vec::new();
    while buffered.len() < MAX_ERROR_BODY_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = MAX_ERROR_BODY_BYTES - buffered.len();
                buffered.extend_from_slice(&chunk[..chunk.len().min(room)]);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e.without_url(), "Failed to read error body");
                break;
            }
        }
    }

    String::from_utf8_lossy(&buffered)
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect()
}

#[async_trait]
impl TransformClient for HttpTransformClient {
    #[tracing::instrument(skip_all, fields(
        endpoint = %self.endpoint,
        source_key = %source.key()
    ))]
    async fn transform(&self, source: &SignedUrl) -> Result<TransformResult, RelayError> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[(SOURCE_URL_PARAM, source.as_str())])
            .send()
            .await
            .map_err(unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let message = error_excerpt(response).await;
            tracing::warn!(status = status.as_u16(), "Transform service returned an error");
            return Err(RelayError::UpstreamError {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| RelayError::UpstreamError {
                status: status.as_u16(),
                message: "transform service response has no content-type".to_string(),
            })?;

        let bytes = response.bytes().await.map_err(unreachable)?;

        tracing::info!(
            content_type = %content_type,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Transform completed"
        );

        Ok(TransformResult::new(bytes, content_type))
    }
}
