//! Pixfeed Services Layer
//!
//! This crate is the **service layer**: the transform relay and the
//! collaborators it composes (signed URL provider, transform client,
//! uploader), plus the feed metadata store the HTTP layer persists posts in.
//! Boundary crates (API, CLI) depend on this facade and only map
//! `RelayError` variants to their own responses.

pub mod feed_store;
pub mod relay;
pub mod transform_client;

pub use feed_store::{FeedItemStore, InMemoryFeedStore};
pub use pixfeed_storage::{
    create_signer, HttpUploader, ObjectUploader, SignedUrlProvider, StorageBackend, StorageError,
    StorageResult,
};
pub use relay::{RelayTimeouts, TransformRelay};
pub use transform_client::{HttpTransformClient, TransformClient};

use pixfeed_core::Config;
use std::sync::Arc;

/// Wire the production relay from configuration
pub fn build_relay(config: &Config) -> anyhow::Result<TransformRelay> {
    let timeouts = RelayTimeouts::from_config(config);
    let signer = create_signer(config)?;
    let transformer = HttpTransformClient::new(config.transform_service_url(), timeouts.transform)?;
    let uploader = HttpUploader::new(timeouts.upload)?;

    tracing::info!(
        storage_backend = %signer.backend_type(),
        transform_endpoint = %transformer.endpoint(),
        "Transform relay configured"
    );

    Ok(TransformRelay::new(
        signer,
        Arc::new(transformer),
        Arc::new(uploader),
        timeouts,
    ))
}
