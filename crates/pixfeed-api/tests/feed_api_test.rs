//! Feed and media routes end to end, with the local backend in a temp dir
//! and a fake transform service.

use async_trait::async_trait;
use axum_test::TestServer;
use bytes::Bytes;
use pixfeed_api::setup::routes::setup_routes;
use pixfeed_api::{AppState, ErrorResponse};
use pixfeed_core::models::{FeedPostResponse, SignedUrlResponse};
use pixfeed_core::{Config, ObjectKey, RelayError, SignedUrl, TransformResult};
use pixfeed_services::{
    InMemoryFeedStore, ObjectUploader, RelayTimeouts, StorageResult, TransformClient,
    TransformRelay,
};
use pixfeed_storage::{create_local_media, LocalObjectStore};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

const BASE_URL: &str = "http://localhost:8080";
const TRANSFORMED: &[u8] = b"grayscale-jpeg-bytes";

struct FakeTransformer {
    fail_with: Option<RelayError>,
}

#[async_trait]
impl TransformClient for FakeTransformer {
    async fn transform(&self, _source: &SignedUrl) -> Result<TransformResult, RelayError> {
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(TransformResult::new(
                Bytes::from_static(TRANSFORMED),
                "image/jpeg",
            )),
        }
    }
}

/// Writes straight into the store the `/media` routes serve from
struct StoreUploader {
    store: LocalObjectStore,
}

#[async_trait]
impl ObjectUploader for StoreUploader {
    async fn put(&self, target: &SignedUrl, body: Bytes, content_type: &str) -> StorageResult<()> {
        self.store.write(target.key(), body, content_type).await
    }
}

struct TestApp {
    server: TestServer,
    store: LocalObjectStore,
    _dir: TempDir,
}

async fn test_app(fail_with: Option<RelayError>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_string_lossy().to_string();
    let media_base = format!("{}/media", BASE_URL);

    let vars: HashMap<&str, String> = HashMap::from([
        ("STORAGE_BACKEND", "local".to_string()),
        ("LOCAL_STORAGE_PATH", path),
        ("LOCAL_STORAGE_BASE_URL", media_base),
        (
            "LOCAL_SIGNING_KEY",
            "0123456789abcdef0123456789abcdef".to_string(),
        ),
        ("TRANSFORM_SERVICE_URL", "localhost:8082".to_string()),
    ]);
    let config = Config::from_vars(|key| vars.get(key).cloned()).unwrap();

    let media = create_local_media(&config).await.unwrap().unwrap();
    let store = media.store.clone();

    let relay = TransformRelay::new(
        media.signer.clone(),
        Arc::new(FakeTransformer { fail_with }),
        Arc::new(StoreUploader {
            store: store.clone(),
        }),
        RelayTimeouts::default(),
    );

    let state = Arc::new(AppState::new(
        config.clone(),
        relay,
        Arc::new(InMemoryFeedStore::new()),
        Some(media),
    ));
    let router = setup_routes(&config, state).unwrap();

    TestApp {
        server: TestServer::new(router).unwrap(),
        store,
        _dir: dir,
    }
}

/// Split a signed URL into the server-relative path and its query pairs
fn split_signed_url(url: &str) -> (String, Vec<(String, String)>) {
    let relative = url.strip_prefix(BASE_URL).unwrap();
    let (path, query) = relative.split_once('?').unwrap();
    let params = query
        .split('&')
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap();
            (k.to_string(), v.to_string())
        })
        .collect();
    (path.to_string(), params)
}

async fn upload_original(app: &TestApp, key: &str, body: &'static [u8]) {
    let response = app
        .server
        .get(&format!("/api/v0/feed/signed-url/{}", key))
        .await;
    assert_eq!(response.status_code(), 201);
    let signed: SignedUrlResponse = response.json();

    let (path, params) = split_signed_url(&signed.url);
    let mut request = app
        .server
        .put(&path)
        .content_type("image/png")
        .bytes(Bytes::from_static(body));
    for (k, v) in &params {
        request = request.add_query_param(k, v);
    }
    let response = request.await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_health() {
    let app = test_app(None).await;

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage_backend"], "local");
}

#[tokio::test]
async fn test_signed_upload_url() {
    let app = test_app(None).await;

    let response = app.server.get("/api/v0/feed/signed-url/photo.jpg").await;

    assert_eq!(response.status_code(), 201);
    let signed: SignedUrlResponse = response.json();
    assert_eq!(signed.key, "photo.jpg");
    assert!(signed
        .url
        .starts_with("http://localhost:8080/media/photo.jpg?method=PUT&expires="));
}

#[tokio::test]
async fn test_signed_upload_url_rejects_bad_key() {
    let app = test_app(None).await;

    let response = app.server.get("/api/v0/feed/signed-url/bad%5Cname.jpg").await;

    assert_eq!(response.status_code(), 400);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "INVALID_KEY");
}

#[tokio::test]
async fn test_create_post_with_transform_replaces_object() {
    let app = test_app(None).await;
    upload_original(&app, "photo.jpg", b"original-png-bytes").await;

    let response = app
        .server
        .post("/api/v0/feed")
        .json(&json!({"caption": "sunset", "url": "photo.jpg", "transform": true}))
        .await;

    assert_eq!(response.status_code(), 201);
    let post: FeedPostResponse = response.json();
    assert_eq!(post.caption, "sunset");
    assert_eq!(post.transformed, Some(true));
    assert!(post.url.contains("/media/photo.jpg?method=GET"));

    let (data, content_type) = app
        .store
        .read(&ObjectKey::parse("photo.jpg").unwrap())
        .await
        .unwrap();
    assert_eq!(data.as_ref(), TRANSFORMED);
    assert_eq!(content_type, "image/jpeg");

    // The returned URL serves the transformed bytes
    let (path, params) = split_signed_url(&post.url);
    let mut request = app.server.get(&path);
    for (k, v) in &params {
        request = request.add_query_param(k, v);
    }
    let response = request.await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "image/jpeg");
    assert_eq!(response.as_bytes().as_ref(), TRANSFORMED);
}

#[tokio::test]
async fn test_create_post_without_transform_keeps_original() {
    let app = test_app(None).await;
    upload_original(&app, "raw%2F42.jpg", b"original-png-bytes").await;

    let response = app
        .server
        .post("/api/v0/feed")
        .json(&json!({"caption": "as is", "url": "raw/42.jpg", "transform": false}))
        .await;

    assert_eq!(response.status_code(), 201);
    let post: FeedPostResponse = response.json();
    assert_eq!(post.transformed, Some(false));

    let (data, content_type) = app
        .store
        .read(&ObjectKey::parse("raw/42.jpg").unwrap())
        .await
        .unwrap();
    assert_eq!(data.as_ref(), b"original-png-bytes");
    assert_eq!(content_type, "image/png");
}

#[tokio::test]
async fn test_create_post_requires_transform_flag() {
    let app = test_app(None).await;

    let response = app
        .server
        .post("/api/v0/feed")
        .json(&json!({"caption": "sunset", "url": "photo.jpg"}))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "INVALID_INPUT");
}

#[tokio::test]
async fn test_create_post_rejects_malformed_json() {
    let app = test_app(None).await;

    let response = app
        .server
        .post("/api/v0/feed")
        .content_type("application/json")
        .bytes(Bytes::from_static(b"{not json"))
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_transform_failure_maps_to_bad_gateway() {
    let app = test_app(Some(RelayError::UpstreamError {
        status: 500,
        message: "decoder crashed".to_string(),
    }))
    .await;
    upload_original(&app, "photo.jpg", b"original-png-bytes").await;

    let response = app
        .server
        .post("/api/v0/feed")
        .json(&json!({"caption": "sunset", "url": "photo.jpg", "transform": true}))
        .await;

    assert_eq!(response.status_code(), 502);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "TRANSFORM_FAILED");

    let (data, _) = app
        .store
        .read(&ObjectKey::parse("photo.jpg").unwrap())
        .await
        .unwrap();
    assert_eq!(data.as_ref(), b"original-png-bytes");
}

#[tokio::test]
async fn test_unreachable_transform_is_service_unavailable() {
    let app = test_app(Some(RelayError::UpstreamUnreachable(
        "connection refused".to_string(),
    )))
    .await;

    let response = app
        .server
        .post("/api/v0/feed")
        .json(&json!({"caption": "sunset", "url": "photo.jpg", "transform": true}))
        .await;

    assert_eq!(response.status_code(), 503);
    let body: ErrorResponse = response.json();
    assert!(body.recoverable);
}

#[tokio::test]
async fn test_get_and_update_post() {
    let app = test_app(None).await;

    let created: FeedPostResponse = app
        .server
        .post("/api/v0/feed")
        .json(&json!({"caption": "first", "url": "a.jpg", "transform": false}))
        .await
        .json();

    let response = app.server.get(&format!("/api/v0/feed/{}", created.id)).await;
    assert_eq!(response.status_code(), 200);
    let fetched: FeedPostResponse = response.json();
    assert_eq!(fetched.caption, "first");
    assert_eq!(fetched.transformed, None);
    assert!(fetched.url.contains("/media/a.jpg?method=GET"));

    let response = app
        .server
        .patch(&format!("/api/v0/feed/{}", created.id))
        .json(&json!({"caption": "second", "url": "b.jpg"}))
        .await;
    assert_eq!(response.status_code(), 200);
    let updated: FeedPostResponse = response.json();
    assert_eq!(updated.caption, "second");
    assert!(updated.url.contains("/media/b.jpg?method=GET"));
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_missing_post() {
    let app = test_app(None).await;
    let id = uuid::Uuid::new_v4();

    let response = app.server.get(&format!("/api/v0/feed/{}", id)).await;
    assert_eq!(response.status_code(), 404);

    let response = app
        .server
        .patch(&format!("/api/v0/feed/{}", id))
        .json(&json!({"caption": "nope"}))
        .await;
    assert_eq!(response.status_code(), 404);

    let response = app.server.get("/api/v0/feed/not-a-uuid").await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_empty_update_is_rejected() {
    let app = test_app(None).await;

    let created: FeedPostResponse = app
        .server
        .post("/api/v0/feed")
        .json(&json!({"caption": "first", "url": "a.jpg", "transform": false}))
        .await
        .json();

    let response = app
        .server
        .patch(&format!("/api/v0/feed/{}", created.id))
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_media_rejects_tampered_signature() {
    let app = test_app(None).await;
    upload_original(&app, "photo.jpg", b"original-png-bytes").await;

    let response = app
        .server
        .get("/api/v0/feed/signed-url/photo.jpg")
        .await;
    let signed: SignedUrlResponse = response.json();
    let (path, params) = split_signed_url(&signed.url);

    // A write URL must not be usable for reading
    let mut request = app.server.get(&path);
    for (k, v) in &params {
        let v = if k == "method" { "GET" } else { v.as_str() };
        request = request.add_query_param(k, v);
    }
    assert_eq!(request.await.status_code(), 403);

    let response = app
        .server
        .get(&path)
        .add_query_param("method", "GET")
        .add_query_param("expires", "99999999999")
        .add_query_param("signature", "deadbeef")
        .await;
    assert_eq!(response.status_code(), 403);

    let response = app.server.get(&path).await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_media_missing_object() {
    let app = test_app(None).await;

    let created: FeedPostResponse = app
        .server
        .post("/api/v0/feed")
        .json(&json!({"caption": "ghost", "url": "never-uploaded.jpg", "transform": false}))
        .await
        .json();

    let (path, params) = split_signed_url(&created.url);
    let mut request = app.server.get(&path);
    for (k, v) in &params {
        request = request.add_query_param(k, v);
    }
    assert_eq!(request.await.status_code(), 404);
}
