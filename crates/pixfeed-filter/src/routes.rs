//! Router and server loop

use crate::handlers;
use crate::state::FilterState;
use axum::{routing::get, Router};
use pixfeed_core::FilterServiceConfig;
use pixfeed_infra::{request_id_middleware, shutdown_signal};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::trace::TraceLayer;

/// Decodes run on the blocking pool; bound how many are in flight
const MAX_CONCURRENT_REQUESTS: usize = 64;

pub fn build_router(state: Arc<FilterState>) -> Router {
    Router::new()
        .route("/", get(handlers::usage))
        .route("/health", get(handlers::health_check))
        .route("/filteredimage", get(handlers::filtered_image))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

pub async fn serve(config: FilterServiceConfig) -> anyhow::Result<()> {
    let state = Arc::new(FilterState::from_config(&config)?);
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.base.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        addr = %addr,
        output_size = config.output_size,
        jpeg_quality = config.jpeg_quality,
        max_input_bytes = config.max_input_bytes,
        allow_private_urls = config.allow_private_urls,
        allowlist = ?config.url_allowlist,
        "Transform service ready and accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
