//! Route configuration and setup

use crate::constants::{FEED_PREFIX, MAX_JSON_BODY_BYTES, MAX_MEDIA_UPLOAD_BYTES, MEDIA_PREFIX};
use crate::handlers::{feed, health, media};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use pixfeed_core::Config;
use pixfeed_infra::request_id_middleware;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let app = Router::new()
        .route("/health", get(health::health_check))
        .merge(feed_routes())
        .merge(media_routes())
        .layer(RequestBodyLimitLayer::new(MAX_MEDIA_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn feed_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/signed-url/{{file_name}}", FEED_PREFIX),
            get(feed::get_signed_upload_url),
        )
        .route(FEED_PREFIX, axum::routing::post(feed::create_feed_post))
        .route(
            &format!("{}/{{id}}", FEED_PREFIX),
            get(feed::get_feed_post).patch(feed::update_feed_post),
        )
        .layer(DefaultBodyLimit::max(MAX_JSON_BODY_BYTES))
}

fn media_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/{{*key}}", MEDIA_PREFIX),
            get(media::get_media).put(media::put_media),
        )
        .layer(DefaultBodyLimit::max(MAX_MEDIA_UPLOAD_BYTES))
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::PUT,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
