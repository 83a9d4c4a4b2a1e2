//! Signed object access for the local storage backend
//!
//! `/media/{*key}` is the target of the URLs `LocalUrlSigner` mints: GET
//! serves the object, PUT replaces it atomically. Both require a valid,
//! unexpired signature for the matching method.

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
};
use bytes::Bytes;
use chrono::Utc;
use pixfeed_core::models::Direction;
use pixfeed_core::{AppError, ObjectKey};
use pixfeed_storage::LocalMedia;
use serde::Deserialize;
use std::sync::Arc;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub method: Option<String>,
    pub expires: Option<String>,
    pub signature: Option<String>,
}

fn local_media(state: &AppState) -> Result<&LocalMedia, HttpAppError> {
    state.local_media.as_ref().ok_or_else(|| {
        HttpAppError(AppError::NotFound(
            "Media routes are only served by the local storage backend".to_string(),
        ))
    })
}

/// Check the query against the signature for `direction` and return the key
fn authorize(
    media: &LocalMedia,
    raw_key: String,
    query: &MediaQuery,
    direction: Direction,
) -> Result<ObjectKey, HttpAppError> {
    let key = ObjectKey::parse(raw_key)?;

    let forbidden = |msg: &str| HttpAppError(AppError::Forbidden(msg.to_string()));

    match query.method.as_deref() {
        Some(method) if method.eq_ignore_ascii_case(direction.http_method()) => {}
        Some(_) => return Err(forbidden("URL was signed for a different method")),
        None => return Err(forbidden("Missing method parameter")),
    }

    let expires = query
        .expires
        .as_deref()
        .and_then(|e| e.parse::<i64>().ok())
        .ok_or_else(|| forbidden("Missing or malformed expires parameter"))?;

    let signature = query
        .signature
        .as_deref()
        .ok_or_else(|| forbidden("Missing signature parameter"))?;

    media
        .signer
        .verify(direction, &key, expires, signature, Utc::now())?;

    Ok(key)
}

#[tracing::instrument(skip_all, fields(operation = "media_get"))]
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<MediaQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let media = local_media(&state)?;
    let key = authorize(media, key, &query, Direction::Read)?;

    let (data, content_type) = media.store.read(&key).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "private, no-store".to_string()),
        ],
        data,
    ))
}

#[tracing::instrument(skip_all, fields(operation = "media_put"))]
pub async fn put_media(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(query): Query<MediaQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let media = local_media(&state)?;
    let key = authorize(media, key, &query, Direction::Write)?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    media.store.write(&key, body, content_type).await?;

    Ok(StatusCode::OK)
}
