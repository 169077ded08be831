//! Upstream forwarding
//!
//! Sends an inbound request to the selected upstream and turns the upstream
//! response into the response relayed to the caller. Bodies are streamed in
//! both directions; nothing is read fully into memory, so Server-Sent Events
//! reach the caller as the upstream emits them.

use axum::body::{Body, HttpBody};
use axum::extract::Request;
use axum::http::{header, Response};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, Url};
use tracing::Instrument;

use super::headers::filter_headers;
use super::logging::RequestContext;
use super::upstream::UpstreamTarget;
use crate::error::{AppError, AppResult};

/// Forward `request` to `url` on `target`.
///
/// Transport failures (connect, DNS, TLS, timeouts) become
/// [`AppError::BadGateway`]. Any status the upstream actually returns,
/// including 4xx and 5xx, is relayed unchanged.
pub async fn forward_request(
    client: &Client,
    target: &UpstreamTarget,
    url: Url,
    request: Request,
    ctx: RequestContext,
) -> AppResult<Response<Body>> {
    let span = ctx.create_span();

    async move {
        let (parts, body) = request.into_parts();

        let mut headers = filter_headers(&parts.headers);
        target.apply_credentials(&mut headers, &parts.headers);

        let has_body = !body.is_end_stream();
        ctx.log_upstream_request(headers.len(), has_body);

        let mut builder = client.request(parts.method, url).headers(headers);
        if has_body {
            let data_stream = body
                .into_data_stream()
                .map(|result| result.map_err(|err| std::io::Error::other(err.to_string())));
            builder = builder.body(reqwest::Body::wrap_stream(data_stream));
        }

        let response = builder.send().await.map_err(|err| {
            ctx.log_connection_error(&err.to_string());
            AppError::BadGateway(err)
        })?;

        Ok(relay_response(response, ctx))
    }
    .instrument(span)
    .await
}

/// Convert the upstream response into the caller's response.
fn relay_response(response: reqwest::Response, ctx: RequestContext) -> Response<Body> {
    let status = response.status();
    let headers = filter_headers(response.headers());

    ctx.log_upstream_response(
        status.as_u16(),
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
    );

    let body = Body::from_stream(relay_stream(response.bytes_stream(), ctx));

    let mut relayed = Response::new(body);
    *relayed.status_mut() = status;
    *relayed.headers_mut() = headers;
    relayed
}

/// Pass upstream chunks through one at a time, logging when the body ends.
fn relay_stream<S>(
    upstream: S,
    ctx: RequestContext,
) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    async_stream::stream! {
        let mut upstream = Box::pin(upstream);
        let mut chunks = 0usize;
        let mut bytes = 0usize;

        loop {
            match upstream.next().await {
                Some(Ok(chunk)) => {
                    chunks += 1;
                    bytes += chunk.len();
                    yield Ok(chunk);
                }
                Some(Err(err)) => {
                    ctx.log_stream_error(&err.to_string());
                    yield Err(err);
                    break;
                }
                None => {
                    ctx.log_stream_ended(chunks, bytes);
                    break;
                }
            }
        }
    }
}
