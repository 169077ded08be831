//! Pass-through proxy handler
//!
//! Forwards every authenticated request under `/openai/` or `/anthropic/` to
//! the matching upstream without parsing the body.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    response::Response,
};

use crate::{
    error::{AppError, AppResult},
    proxy::{forward_request, RequestContext, Upstream},
    AppState,
};

/// Pass-through handler for everything that isn't the health check
///
/// This handler:
/// 1. Selects the upstream from the path prefix (404 if none matches)
/// 2. Rebuilds the upstream URL, keeping the inbound query
/// 3. Forwards the request and streams the response back
pub async fn passthrough_handler(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> AppResult<Response> {
    let path = request.uri().path().to_string();
    let upstream = Upstream::from_path(&path).ok_or(AppError::NotFound)?;
    let target = state.upstreams.get(upstream);

    let url = target.url_for(&path, request.uri().query());
    let ctx = RequestContext::new(upstream, request.method(), &path)
        .with_upstream_url(url.as_str());
    ctx.log_request_start();

    forward_request(&state.http_client, target, url, request, ctx).await
}
