use crate::error::FilterError;
use crate::state::FilterState;
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use pixfeed_processing::OUTPUT_CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

pub const USAGE_HINT: &str = "try GET /filteredimage?image_url={URL}";

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub image_url: Option<String>,
}

/// Fetch `image_url` and return it as a square grayscale JPEG
#[tracing::instrument(skip_all, fields(operation = "filtered_image"))]
pub async fn filtered_image(
    State(state): State<Arc<FilterState>>,
    Query(query): Query<FilterQuery>,
) -> Result<impl IntoResponse, FilterError> {
    let raw = query
        .image_url
        .ok_or_else(|| FilterError::InvalidUrl("image_url is required".to_string()))?;

    let url = state.policy.check(&raw).await?;
    tracing::debug!(host = ?url.host_str(), "Filtering source image");

    let source = state.fetcher.fetch(&url).await?;
    let source_size = source.len();

    let output = state.filter.apply_blocking(source).await?;

    tracing::info!(
        source_size_bytes = source_size,
        output_size_bytes = output.len(),
        size = state.filter.size(),
        "Image filtered"
    );

    Ok(([(header::CONTENT_TYPE, OUTPUT_CONTENT_TYPE)], output))
}

pub async fn usage() -> impl IntoResponse {
    USAGE_HINT
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
