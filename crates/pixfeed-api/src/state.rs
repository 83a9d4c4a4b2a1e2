//! Application state shared by all handlers

use pixfeed_core::Config;
use pixfeed_services::{FeedItemStore, TransformRelay};
use pixfeed_storage::LocalMedia;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub relay: Arc<TransformRelay>,
    pub feed_store: Arc<dyn FeedItemStore>,
    /// Present only with `STORAGE_BACKEND=local`; backs the `/media` routes
    pub local_media: Option<LocalMedia>,
}

impl AppState {
    pub fn new(
        config: Config,
        relay: TransformRelay,
        feed_store: Arc<dyn FeedItemStore>,
        local_media: Option<LocalMedia>,
    ) -> Self {
        Self {
            config,
            relay: Arc::new(relay),
            feed_store,
            local_media,
        }
    }
}
