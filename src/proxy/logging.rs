//! Request logging utilities for upstream forwarding
//!
//! Provides structured logging with correlation IDs for tracing a request
//! through the proxy. Payloads and credentials are never logged.

use std::time::Instant;

use axum::http::Method;
use tracing::{debug, error, info, Span};
use uuid::Uuid;

use super::upstream::Upstream;

/// Context for one forwarded request
///
/// Created when an upstream has been selected and dropped once the response
/// has been handed back (or the stream has ended).
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request (for log correlation)
    pub trace_id: String,
    /// When the request started
    pub start_time: Instant,
    /// Upstream handling this request
    pub upstream: Upstream,
    /// Inbound method
    pub method: Method,
    /// Inbound path, prefix included
    pub path: String,
    /// URL the request is forwarded to
    pub upstream_url: Option<String>,
}

impl RequestContext {
    /// Create a new request context
    pub fn new(upstream: Upstream, method: &Method, path: &str) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string()[..8].to_string(),
            start_time: Instant::now(),
            upstream,
            method: method.clone(),
            path: path.to_string(),
            upstream_url: None,
        }
    }

    /// Record the upstream URL
    pub fn with_upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = Some(url.into());
        self
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    pub fn log_request_start(&self) {
        info!(
            trace_id = %self.trace_id,
            upstream = %self.upstream.name(),
            method = %self.method,
            path = %self.path,
            "Request started"
        );
    }

    pub fn log_upstream_request(&self, header_count: usize, has_body: bool) {
        debug!(
            trace_id = %self.trace_id,
            upstream = %self.upstream.name(),
            url = ?self.upstream_url,
            header_count = %header_count,
            has_body = %has_body,
            "Sending request to upstream"
        );
    }

    pub fn log_upstream_response(&self, status: u16, content_type: Option<&str>) {
        info!(
            trace_id = %self.trace_id,
            upstream = %self.upstream.name(),
            status = %status,
            content_type = ?content_type,
            elapsed_ms = %self.elapsed_ms(),
            "Response received from upstream"
        );
    }

    /// Log the end of a relayed response body
    pub fn log_stream_ended(&self, chunks: usize, bytes: usize) {
        debug!(
            trace_id = %self.trace_id,
            upstream = %self.upstream.name(),
            chunks = %chunks,
            bytes = %bytes,
            elapsed_ms = %self.elapsed_ms(),
            "Response stream ended"
        );
    }

    /// Log an error that cut a relayed response body short
    pub fn log_stream_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            upstream = %self.upstream.name(),
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Response stream failed"
        );
    }

    /// Log a transport failure reaching the upstream
    pub fn log_connection_error(&self, error: &str) {
        error!(
            trace_id = %self.trace_id,
            upstream = %self.upstream.name(),
            url = ?self.upstream_url,
            elapsed_ms = %self.elapsed_ms(),
            error = %error,
            "Connection to upstream failed"
        );
    }

    /// Create a tracing span for this request
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "forward",
            trace_id = %self.trace_id,
            upstream = %self.upstream.name(),
            method = %self.method,
        )
    }
}
