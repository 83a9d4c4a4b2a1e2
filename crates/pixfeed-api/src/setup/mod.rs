//! Application setup and initialization
//!
//! Everything `main` needs between loading configuration and serving:
//! telemetry, the relay and its collaborators, local media storage and the
//! router.

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use pixfeed_core::Config;
use pixfeed_services::{build_relay, InMemoryFeedStore};
use pixfeed_storage::create_local_media;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    pixfeed_infra::init_telemetry("pixfeed-api", config.log_json())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        storage_backend = %config.storage_backend(),
        "Configuration loaded and validated successfully"
    );

    let relay = build_relay(&config).context("Failed to configure transform relay")?;

    let local_media = create_local_media(&config)
        .await
        .context("Failed to set up local media storage")?;

    let state = Arc::new(AppState::new(
        config.clone(),
        relay,
        Arc::new(InMemoryFeedStore::new()),
        local_media,
    ));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
