// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use web_bookmark::{
    auth::{create_access_token, EDIT_POSTS},
    bookmark::{DirectSource, Extractor},
    handlers,
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "test-secret-min-32-characters-long!!";
pub const TEST_FETCH_TIMEOUT: Duration = Duration::from_secs(2);

/// Application state for tests. Private hosts are reachable so the fixture
/// server on 127.0.0.1 can be fetched.
pub fn test_state() -> AppState {
    test_state_with(true)
}

pub fn test_state_with(allow_private_hosts: bool) -> AppState {
    let http_client =
        DirectSource::build_client(TEST_FETCH_TIMEOUT, "web-bookmark-tests", allow_private_hosts)
            .expect("Failed to build test HTTP client");
    AppState {
        jwt_secret: Arc::from(TEST_JWT_SECRET),
        http_client,
        fetch_timeout: TEST_FETCH_TIMEOUT,
        allow_private_hosts,
        max_body_bytes: 64 * 1024,
        extractor: Extractor::default(),
    }
}

/// Build the full application router around `state`.
pub fn create_test_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/web-bookmark-block/v1/fetch",
            get(handlers::fetch::fetch_page),
        )
        .route(
            "/web-bookmark-block/v1/render/saved",
            post(handlers::render::render_saved_card),
        )
        .route(
            "/web-bookmark-block/v1/render/preview",
            post(handlers::render::render_preview_card),
        )
        .route(
            "/web-bookmark-block/v1/resolve",
            post(handlers::resolve::resolve_bookmark),
        )
        .route(
            "/web-bookmark-block/v1/attributes",
            post(handlers::resolve::update_attributes),
        )
        .fallback(handlers::not_found)
        .with_state(state)
}

/// Serve the application on an ephemeral local port and return its base URL.
pub async fn spawn_app(state: AppState) -> String {
    serve(create_test_app(state)).await
}

// ── Tokens ───────────────────────────────────────────────────────────────────

/// Token for an editor holding `edit_posts`.
pub fn editor_token() -> String {
    create_access_token("editor", &[EDIT_POSTS], TEST_JWT_SECRET).unwrap()
}

/// Token for an authenticated user without `edit_posts`.
pub fn reader_token() -> String {
    create_access_token("reader", &["read"], TEST_JWT_SECRET).unwrap()
}

// ── Fixture site ─────────────────────────────────────────────────────────────

pub const ARTICLE_HTML: &str = r#"<!doctype html>
<html>
<head>
  <title>Fallback title</title>
  <meta property="og:title" content="A &amp; B article">
  <meta property="og:description" content="Everything about A and B.">
  <meta property="og:image" content="/images/cover.png">
  <link rel="apple-touch-icon" href="/touch.png">
  <link rel="icon" href="/favicon.png">
</head>
<body><p>Body</p></body>
</html>"#;

pub const PLAIN_HTML: &str = r#"<html><head><title>T</title><meta property="og:description" content="D"></head><body></body></html>"#;

/// Start a local site with a handful of pages and return its base URL.
///
/// - `/article`: full Open Graph markup with relative assets
/// - `/plain`: title and description only
/// - `/image.png`: a non-HTML response
/// - `/missing`: 404
/// - `/slow`: answers after five seconds
pub async fn spawn_fixture_site() -> String {
    let site = Router::new()
        .route("/article", get(|| async { Html(ARTICLE_HTML) }))
        .route("/plain", get(|| async { Html(PLAIN_HTML) }))
        .route(
            "/image.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], vec![0x89u8, b'P', b'N', b'G']) }),
        )
        .route(
            "/missing",
            get(|| async { (StatusCode::NOT_FOUND, Html("<title>Gone</title>")).into_response() }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Html(PLAIN_HTML)
            }),
        );
    serve(site).await
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ── Request helpers ──────────────────────────────────────────────────────────

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn post_json_authed(
    app: Router,
    uri: &str,
    token: &str,
    body: Value,
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn get_authed(app: Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn get_no_auth(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

/// POST JSON and return the status, content type and raw text body.
pub async fn post_json_text(app: Router, uri: &str, body: Value) -> (StatusCode, String, String) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Percent-encode `url` for use as the `url` query parameter.
pub fn fetch_uri(url: &str) -> String {
    format!(
        "/web-bookmark-block/v1/fetch?url={}",
        urlencoding::encode(url)
    )
}
