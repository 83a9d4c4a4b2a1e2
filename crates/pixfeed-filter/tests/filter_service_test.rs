use axum_test::TestServer;
use image::{ColorType, GenericImageView, ImageFormat, Rgba, RgbaImage};
use pixfeed_filter::{build_router, FilterState, SourceFetcher, UrlPolicy, USAGE_HINT};
use pixfeed_infra::ErrorResponse;
use pixfeed_processing::GrayscaleThumbnail;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if x % 2 == 0 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 128])
        }
    });
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

fn server(policy: UrlPolicy) -> TestServer {
    let state = FilterState {
        policy,
        fetcher: SourceFetcher::new(Duration::from_secs(5), 1024 * 1024).unwrap(),
        filter: GrayscaleThumbnail::default(),
    };
    TestServer::new(build_router(Arc::new(state))).unwrap()
}

#[tokio::test]
async fn test_filtered_image_is_grayscale_thumbnail() {
    let mut source = mockito::Server::new_async().await;
    let mock = source
        .mock("GET", "/raw/42.png")
        .match_query(mockito::Matcher::UrlEncoded(
            "signature".into(),
            "abc".into(),
        ))
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(png(300, 120))
        .expect(1)
        .create_async()
        .await;

    let response = server(UrlPolicy::new(true, None))
        .get("/filteredimage")
        .add_query_param(
            "image_url",
            format!("{}/raw/42.png?signature=abc", source.url()),
        )
        .await;

    mock.assert_async().await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "image/jpeg");

    let output = response.as_bytes();
    assert_eq!(image::guess_format(output).unwrap(), ImageFormat::Jpeg);
    let decoded = image::load_from_memory(output).unwrap();
    assert_eq!(decoded.dimensions(), (256, 256));
    assert_eq!(decoded.color(), ColorType::L8);
}

#[tokio::test]
async fn test_missing_image_url() {
    let response = server(UrlPolicy::default()).get("/filteredimage").await;

    assert_eq!(response.status_code(), 400);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "INVALID_URL");
}

#[tokio::test]
async fn test_non_http_scheme() {
    let response = server(UrlPolicy::default())
        .get("/filteredimage")
        .add_query_param("image_url", "file:///etc/passwd")
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_private_source_refused_by_default() {
    let response = server(UrlPolicy::new(false, None))
        .get("/filteredimage")
        .add_query_param("image_url", "http://127.0.0.1:9000/a.png")
        .await;

    assert_eq!(response.status_code(), 400);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "URL_NOT_ALLOWED");
}

#[tokio::test]
async fn test_undecodable_source() {
    let mut source = mockito::Server::new_async().await;
    source
        .mock("GET", "/notes.txt")
        .with_status(200)
        .with_body("just some text")
        .create_async()
        .await;

    let response = server(UrlPolicy::new(true, None))
        .get("/filteredimage")
        .add_query_param("image_url", format!("{}/notes.txt", source.url()))
        .await;

    assert_eq!(response.status_code(), 422);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "UNSUPPORTED_IMAGE");
}

#[tokio::test]
async fn test_source_fetch_failure() {
    let mut source = mockito::Server::new_async().await;
    source
        .mock("GET", "/gone.png")
        .with_status(404)
        .create_async()
        .await;

    let response = server(UrlPolicy::new(true, None))
        .get("/filteredimage")
        .add_query_param("image_url", format!("{}/gone.png", source.url()))
        .await;

    assert_eq!(response.status_code(), 502);
    let body: ErrorResponse = response.json();
    assert!(body.recoverable);
}

#[tokio::test]
async fn test_usage_hint_and_health() {
    let server = server(UrlPolicy::default());

    let response = server.get("/").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.text(), USAGE_HINT);

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
}
