//! Authentication middleware
//!
//! Every route except the health check requires the shared proxy token as
//! `Authorization: Bearer <token>`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use tracing::{instrument, warn};

use crate::{error::AppError, AppState};

/// Compare a presented `Authorization` value with the expected token.
///
/// The comparison is byte-exact on the whole header value. Both sides are
/// hashed first so the time taken doesn't depend on how long a matching
/// prefix is.
pub fn token_matches(presented: &[u8], expected_token: &str) -> bool {
    let expected = format!("Bearer {}", expected_token);
    Sha256::digest(presented) == Sha256::digest(expected.as_bytes())
}

/// Authentication middleware
///
/// Rejects the request with [`AppError::Unauthorized`] when the header is
/// missing or doesn't match; otherwise passes it on untouched.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .is_some_and(|value| token_matches(value.as_bytes(), &state.config.proxy_token));

    if !authorized {
        warn!(
            method = %request.method(),
            has_authorization = request.headers().contains_key(header::AUTHORIZATION),
            "Rejected unauthenticated request"
        );
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
