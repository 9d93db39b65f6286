mod common;

use std::time::{Duration, Instant};

use axum::http::StatusCode;

#[tokio::test]
async fn health_check_reports_ok() {
    let app = common::create_test_app(common::test_state());
    let (status, body) = common::get_no_auth(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "web-bookmark-server");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let app = common::create_test_app(common::test_state());
    let (status, body) = common::get_no_auth(app, "/no/such/route").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn fetch_requires_auth() {
    let app = common::create_test_app(common::test_state());
    let (status, body) = common::get_no_auth(app, &common::fetch_uri("https://example.com")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "got {body}");
}

#[tokio::test]
async fn fetch_rejects_bad_token() {
    let app = common::create_test_app(common::test_state());
    let (status, _) =
        common::get_authed(app, &common::fetch_uri("https://example.com"), "not-a-jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn fetch_requires_edit_posts() {
    let app = common::create_test_app(common::test_state());
    let (status, body) = common::get_authed(
        app,
        &common::fetch_uri("https://example.com"),
        &common::reader_token(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "got {body}");
}

#[tokio::test]
async fn fetch_rejects_invalid_url() {
    let app = common::create_test_app(common::test_state());
    let (status, body) =
        common::get_authed(app, &common::fetch_uri("not-a-url"), &common::editor_token()).await;
    assert_eq!(
        status,
        StatusCode::BAD_REQUEST,
        "expected 400, got {status}: {body}"
    );
}

#[tokio::test]
async fn fetch_rejects_non_http_scheme() {
    let app = common::create_test_app(common::test_state());
    let (status, body) = common::get_authed(
        app,
        &common::fetch_uri("ftp://example.com/file"),
        &common::editor_token(),
    )
    .await;
    assert_eq!(
        status,
        StatusCode::BAD_REQUEST,
        "expected 400, got {status}: {body}"
    );
}

#[tokio::test]
async fn fetch_returns_page_html() {
    let site = common::spawn_fixture_site().await;
    let app = common::create_test_app(common::test_state());

    let (status, body) = common::get_authed(
        app,
        &common::fetch_uri(&format!("  {site}/plain  ")),
        &common::editor_token(),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "got {body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["html"].as_str().unwrap(), common::PLAIN_HTML);
}

#[tokio::test]
async fn fetch_failure_answers_success_false() {
    let site = common::spawn_fixture_site().await;

    for path in ["/missing", "/image.png"] {
        let app = common::create_test_app(common::test_state());
        let (status, body) = common::get_authed(
            app,
            &common::fetch_uri(&format!("{site}{path}")),
            &common::editor_token(),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{path}: {body}");
        assert_eq!(body["success"], false, "{path}: {body}");
        assert!(body.get("html").is_none(), "{path}: {body}");
    }
}

#[tokio::test]
async fn fetch_blocks_private_hosts_unless_allowed() {
    let site = common::spawn_fixture_site().await;
    let app = common::create_test_app(common::test_state_with(false));

    let (status, body) = common::get_authed(
        app,
        &common::fetch_uri(&format!("{site}/plain")),
        &common::editor_token(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false, "loopback fetch should be refused: {body}");
}

#[tokio::test]
async fn fetch_gives_up_at_the_configured_timeout() {
    let site = common::spawn_fixture_site().await;
    let mut state = common::test_state();
    state.fetch_timeout = Duration::from_millis(300);
    let app = common::create_test_app(state);

    let started = Instant::now();
    let (status, body) = common::get_authed(
        app,
        &common::fetch_uri(&format!("{site}/slow")),
        &common::editor_token(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false, "got {body}");
    // Well under the HTTP client's own timeout.
    assert!(started.elapsed() < common::TEST_FETCH_TIMEOUT, "took {:?}", started.elapsed());
}
