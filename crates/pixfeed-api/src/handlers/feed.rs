//! Feed endpoints
//!
//! A client first asks for a signed write URL, PUTs the file there, and then
//! creates the post with the key it uploaded under. Creating a post runs the
//! transform relay over that key; every response carries a fresh signed read
//! URL instead of the stored key.

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use pixfeed_core::models::{
    CreateFeedPostRequest, FeedPostResponse, SignedUrlResponse, UpdateFeedPostRequest,
};
use pixfeed_core::{AppError, FeedPost, ObjectKey, RelayError};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

fn parse_post_id(raw: &str) -> Result<Uuid, HttpAppError> {
    Uuid::parse_str(raw)
        .map_err(|_| HttpAppError(AppError::InvalidInput(format!("Invalid feed id: {}", raw))))
}

async fn read_url(state: &AppState, key: &ObjectKey) -> Result<String, HttpAppError> {
    let url = state
        .relay
        .signer()
        .for_read(key)
        .await
        .map_err(RelayError::from)?;
    Ok(url.into_string())
}

#[tracing::instrument(skip_all, fields(operation = "signed_upload_url"))]
pub async fn get_signed_upload_url(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let key = ObjectKey::parse(file_name)?;

    let signed = state
        .relay
        .signer()
        .for_write(&key)
        .await
        .map_err(RelayError::from)?;

    tracing::debug!(key = %key, expires_at = %signed.expires_at(), "Issued signed upload URL");

    let response = SignedUrlResponse {
        expires_at: signed.expires_at(),
        key: key.into_inner(),
        url: signed.into_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

#[tracing::instrument(skip_all, fields(operation = "create_feed_post"))]
pub async fn create_feed_post(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateFeedPostRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;

    let object_key = ObjectKey::parse(request.url.as_str())?;
    let do_transform = request.transform.unwrap_or(false);

    let post = state
        .feed_store
        .create(FeedPost::new(request.caption, object_key))
        .await?;

    tracing::info!(
        post_id = %post.id,
        key = %post.object_key,
        transform = do_transform,
        "Feed post created"
    );

    let final_ref = state
        .relay
        .process(post.object_key.as_str(), post.object_key.as_str(), do_transform)
        .await?;

    let transformed = final_ref.transformed();
    let response =
        FeedPostResponse::from_post(post, final_ref.into_url().into_string(), Some(transformed));

    Ok((StatusCode::CREATED, Json(response)))
}

#[tracing::instrument(skip_all, fields(operation = "get_feed_post"))]
pub async fn get_feed_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_post_id(&id)?;

    let post = state
        .feed_store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Feed post {} not found", id)))?;

    let url = read_url(&state, &post.object_key).await?;

    Ok(Json(FeedPostResponse::from_post(post, url, None)))
}

#[tracing::instrument(skip_all, fields(operation = "update_feed_post"))]
pub async fn update_feed_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateFeedPostRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = parse_post_id(&id)?;
    request.validate()?;

    if request.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one of caption or url must be provided".to_string(),
        )
        .into());
    }

    let object_key = request.url.map(ObjectKey::parse).transpose()?;

    let post = state
        .feed_store
        .update(id, request.caption, object_key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Feed post {} not found", id)))?;

    tracing::info!(post_id = %post.id, key = %post.object_key, "Feed post updated");

    let url = read_url(&state, &post.object_key).await?;

    Ok(Json(FeedPostResponse::from_post(post, url, None)))
}
