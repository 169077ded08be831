//! Streaming integration tests
//!
//! Server-Sent Events must reach the caller as the upstream emits them, and
//! request bodies of unknown length must be forwarded without buffering.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, StatusCode},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::{oneshot, Mutex};
use wiremock::{matchers::path, Mock, MockServer, ResponseTemplate};

use crate::common::{proxy_auth, spawn_proxy, spawn_router, test_config, test_server};

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_sse_body_and_content_type_relayed() {
    let upstream = MockServer::start().await;
    Mock::given(path("/v1/stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("data: one\n\ndata: two\n\n", "text/event-stream"),
        )
        .mount(&upstream)
        .await;

    let server = test_server(test_config(&upstream.uri(), "http://127.0.0.1:9"));

    let response = server
        .get("/openai/v1/stream")
        .add_header(header::AUTHORIZATION, proxy_auth())
        .await;

    response.assert_status_ok();
    let content_type = response.header("content-type");
    assert!(content_type.to_str().unwrap().contains("text/event-stream"));

    let body = response.text();
    assert!(body.contains("data: one"));
    assert!(body.contains("data: two"));
}

/// Upstream that sends one event, then waits for `release` before the second
fn gated_sse_upstream(release: oneshot::Receiver<()>) -> Router {
    let gate = Arc::new(Mutex::new(Some(release)));

    Router::new().route(
        "/v1/stream",
        get(move || {
            let gate = gate.clone();
            async move {
                let release = gate.lock().await.take();
                let events = async_stream::stream! {
                    yield Ok::<_, std::io::Error>(Bytes::from_static(b"data: one\n\n"));
                    if let Some(release) = release {
                        let _ = release.await;
                    }
                    yield Ok(Bytes::from_static(b"data: two\n\n"));
                };
                (
                    [(header::CONTENT_TYPE, "text/event-stream")],
                    Body::from_stream(events),
                )
            }
        }),
    )
}

#[tokio::test]
async fn test_sse_first_event_arrives_before_upstream_finishes() {
    let (release_tx, release_rx) = oneshot::channel();
    let upstream = spawn_router(gated_sse_upstream(release_rx)).await;
    let proxy = spawn_proxy(test_config(
        &format!("http://{}", upstream),
        "http://127.0.0.1:9",
    ))
    .await;

    let response = reqwest::Client::new()
        .get(format!("{}/openai/v1/stream", proxy))
        .header(header::AUTHORIZATION, proxy_auth())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.contains("text/event-stream"));

    let mut chunks = response.bytes_stream();
    let mut received = String::new();

    // The upstream is still holding the second event at this point
    while !received.contains("data: one\n\n") {
        let chunk = tokio::time::timeout(STEP_TIMEOUT, chunks.next())
            .await
            .expect("first event was not relayed while upstream was still open")
            .expect("stream ended early")
            .unwrap();
        received.push_str(std::str::from_utf8(&chunk).unwrap());
    }
    assert!(!received.contains("data: two"));

    release_tx.send(()).unwrap();

    while let Some(chunk) = tokio::time::timeout(STEP_TIMEOUT, chunks.next())
        .await
        .expect("stream did not finish")
    {
        received.push_str(std::str::from_utf8(&chunk.unwrap()).unwrap());
    }

    assert_eq!(received, "data: one\n\ndata: two\n\n");
}

/// Upstream that echoes the request body and reports how it was framed
fn echo_upstream() -> Router {
    Router::new().route(
        "/v1/upload",
        post(|headers: axum::http::HeaderMap, body: Body| async move {
            let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
            let framing = if headers.contains_key(header::CONTENT_LENGTH) {
                "length"
            } else {
                "chunked"
            };
            ([("x-framing", framing)], bytes)
        }),
    )
}

#[tokio::test]
async fn test_request_body_of_unknown_length_forwarded() {
    let upstream = spawn_router(echo_upstream()).await;
    let proxy = spawn_proxy(test_config(
        "http://127.0.0.1:9",
        &format!("http://{}", upstream),
    ))
    .await;

    let parts: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"{\"model\":")),
        Ok(Bytes::from_static(b"\"claude\",")),
        Ok(Bytes::from_static(b"\"stream\":true}")),
    ];
    let body = reqwest::Body::wrap_stream(futures::stream::iter(parts));

    let response = reqwest::Client::new()
        .post(format!("{}/anthropic/v1/upload", proxy))
        .header(header::AUTHORIZATION, proxy_auth())
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("x-framing").unwrap(), "chunked");
    assert_eq!(
        response.text().await.unwrap(),
        "{\"model\":\"claude\",\"stream\":true}"
    );
}

#[tokio::test]
async fn test_request_body_with_known_length_forwarded() {
    let upstream = spawn_router(echo_upstream()).await;
    let proxy = spawn_proxy(test_config(
        "http://127.0.0.1:9",
        &format!("http://{}", upstream),
    ))
    .await;

    let response = reqwest::Client::new()
        .post(format!("{}/anthropic/v1/upload", proxy))
        .header(header::AUTHORIZATION, proxy_auth())
        .body("plain body")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "plain body");
}
