//! HTTP routes for llm-proxy
//!
//! `/healthz` is public. Every other request goes through authentication and
//! then the pass-through handler, which answers 404 itself for paths outside
//! `/openai/` and `/anthropic/`.

pub mod health;
pub mod passthrough;

use std::sync::Arc;

use axum::{middleware, routing::any, Router};
use tower_http::trace::TraceLayer;

use crate::{middleware::auth::auth_middleware, AppState};

/// Path of the unauthenticated health check
pub const HEALTH_PATH: &str = "/healthz";

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Authentication wraps the fallback as well, so unknown paths are only
    // reported as 404 to callers holding a valid token
    let protected = Router::new()
        .fallback(passthrough::passthrough_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .route(HEALTH_PATH, any(health::healthz))
        .fallback_service(protected)
        .layer(TraceLayer::new_for_http())
}
