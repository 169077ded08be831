//! Health check endpoint
//!
//! `/healthz` answers `ok` to any method without authentication and without
//! touching an upstream.

/// Liveness probe endpoint
pub async fn healthz() -> &'static str {
    "ok"
}
