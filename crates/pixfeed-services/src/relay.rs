//! Transform relay
//!
//! One invocation walks a fixed sequence and never goes back:
//!
//! ```text
//! RESOLVE_READ -> [transform?] -> INVOKE_TRANSFORM -> RESOLVE_WRITE -> UPLOAD -> DONE
//!                      \-> DONE (source reference is final)
//! ```
//!
//! Each step consumes the previous step's output, so nothing runs in
//! parallel and the first failure ends the invocation. The relay keeps no
//! state between invocations.

use crate::transform_client::TransformClient;
use pixfeed_core::{Config, FinalRef, ObjectKey, RelayError};
use pixfeed_storage::{ObjectUploader, SignedUrlProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bounds for the two network calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayTimeouts {
    pub transform: Duration,
    pub upload: Duration,
}

impl RelayTimeouts {
    pub fn from_config(config: &Config) -> Self {
        Self {
            transform: config.transform_timeout(),
            upload: config.upload_timeout(),
        }
    }
}

impl Default for RelayTimeouts {
    fn default() -> Self {
        Self {
            transform: DEFAULT_TIMEOUT,
            upload: DEFAULT_TIMEOUT,
        }
    }
}

/// Orchestrates signing, the optional transform call and the upload
#[derive(Clone)]
pub struct TransformRelay {
    signer: Arc<dyn SignedUrlProvider>,
    transformer: Arc<dyn TransformClient>,
    uploader: Arc<dyn ObjectUploader>,
    timeouts: RelayTimeouts,
}

impl TransformRelay {
    pub fn new(
        signer: Arc<dyn SignedUrlProvider>,
        transformer: Arc<dyn TransformClient>,
        uploader: Arc<dyn ObjectUploader>,
        timeouts: RelayTimeouts,
    ) -> Self {
        Self {
            signer,
            transformer,
            uploader,
            timeouts,
        }
    }

    pub fn signer(&self) -> &Arc<dyn SignedUrlProvider> {
        &self.signer
    }

    pub fn timeouts(&self) -> RelayTimeouts {
        self.timeouts
    }

    /// Resolve `source_key` and, when `do_transform` is set, replace
    /// `dest_key` with the transformed image.
    ///
    /// `dest_key` is only read when a transform is requested.
    pub async fn process(
        &self,
        source_key: &str,
        dest_key: &str,
        do_transform: bool,
    ) -> Result<FinalRef, RelayError> {
        self.process_with_cancellation(source_key, dest_key, do_transform, &CancellationToken::new())
            .await
    }

    /// Mark an uploaded object as final without transforming it
    pub async fn finalize(&self, source_key: &str) -> Result<FinalRef, RelayError> {
        self.process(source_key, source_key, false).await
    }

    /// Transform `source_key` and store the result under `dest_key`
    pub async fn finalize_with_transform(
        &self,
        source_key: &str,
        dest_key: &str,
    ) -> Result<FinalRef, RelayError> {
        self.process(source_key, dest_key, true).await
    }

    /// Same as [`process`](Self::process), abandoning the in-flight step
    /// as soon as `cancel` fires.
    ///
    /// Cancellation is honoured up to the end of the upload. Once the
    /// destination has been replaced the final read URL is still minted.
    #[tracing::instrument(skip(self, cancel), fields(operation = "relay.process"))]
    pub async fn process_with_cancellation(
        &self,
        source_key: &str,
        dest_key: &str,
        do_transform: bool,
        cancel: &CancellationToken,
    ) -> Result<FinalRef, RelayError> {
        let start = std::time::Instant::now();

        let source = ObjectKey::parse(source_key)?;
        let dest = if do_transform {
            Some(ObjectKey::parse(dest_key)?)
        } else {
            None
        };

        let read_url = until_cancelled(cancel, self.signer.for_read(&source)).await??;
        tracing::debug!(key = %source, "Resolved source read URL");

        let Some(dest) = dest else {
            tracing::info!(
                key = %source,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Relay finished without transform"
            );
            return Ok(FinalRef::new(read_url, false));
        };

        let result = until_cancelled(
            cancel,
            tokio::time::timeout(self.timeouts.transform, self.transformer.transform(&read_url)),
        )
        .await?
        .map_err(|_| {
            RelayError::UpstreamUnreachable(format!(
                "transform did not complete within {:?}",
                self.timeouts.transform
            ))
        })??;
        drop(read_url);
        tracing::debug!(
            content_type = %result.content_type,
            size_bytes = result.len(),
            "Transform returned"
        );

        let write_url = until_cancelled(cancel, self.signer.for_write(&dest)).await??;

        let size = result.len();
        until_cancelled(
            cancel,
            tokio::time::timeout(
                self.timeouts.upload,
                self.uploader
                    .put(&write_url, result.bytes, &result.content_type),
            ),
        )
        .await?
        .map_err(|_| {
            RelayError::UploadFailed(format!(
                "upload did not complete within {:?}",
                self.timeouts.upload
            ))
        })??;
        drop(write_url);

        let final_url = self.signer.for_read(&dest).await?;

        tracing::info!(
            source_key = %source,
            dest_key = %dest,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Relay finished with transform"
        );

        Ok(FinalRef::new(final_url, true))
    }
}

async fn until_cancelled<F>(cancel: &CancellationToken, fut: F) -> Result<F::Output, RelayError>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!("Relay cancelled by caller");
            Err(RelayError::Cancelled)
        }
        output = fut => Ok(output),
    }
}
