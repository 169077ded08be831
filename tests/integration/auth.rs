//! Proxy token integration tests
//!
//! Every path other than `/healthz` requires `Authorization: Bearer <token>`
//! with the exact configured token. Rejected requests never reach upstream.

use axum::http::{header, HeaderValue, StatusCode};
use serde_json::{json, Value};
use wiremock::{matchers::any, Mock, MockServer, ResponseTemplate};

use crate::common::{proxy_auth, test_config, test_server};

/// Upstream that fails the test if it is ever called
async fn untouchable_upstream() -> MockServer {
    let upstream = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    upstream
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let upstream = untouchable_upstream().await;
    let server = test_server(test_config(&upstream.uri(), &upstream.uri()));

    let response = server.get("/openai/v1/test").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.header("content-type"),
        HeaderValue::from_static("application/json")
    );
    assert_eq!(response.json::<Value>(), json!({ "error": "unauthorized" }));
}

#[tokio::test]
async fn test_wrong_token_is_unauthorized() {
    let upstream = untouchable_upstream().await;
    let server = test_server(test_config(&upstream.uri(), &upstream.uri()));

    let response = server
        .post("/anthropic/v1/messages")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer wrong"))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>(), json!({ "error": "unauthorized" }));
}

#[tokio::test]
async fn test_token_comparison_is_exact() {
    let upstream = untouchable_upstream().await;
    let server = test_server(test_config(&upstream.uri(), &upstream.uri()));

    let near_misses = [
        "bearer test-proxy-token",
        "Bearer  test-proxy-token",
        "test-proxy-token",
        "Basic test-proxy-token",
    ];

    for value in near_misses {
        let response = server
            .get("/openai/v1/models")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static(value))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_unknown_path_without_token_is_unauthorized() {
    let upstream = untouchable_upstream().await;
    let server = test_server(test_config(&upstream.uri(), &upstream.uri()));

    let response = server.get("/v1/chat/completions").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_path_with_token_is_not_found() {
    let upstream = untouchable_upstream().await;
    let server = test_server(test_config(&upstream.uri(), &upstream.uri()));

    for path in ["/", "/v1/chat/completions", "/openai", "/anthropicx/v1", "/healthz/"] {
        let response = server
            .get(path)
            .add_header(header::AUTHORIZATION, proxy_auth())
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.text(), "not found");
    }
}
