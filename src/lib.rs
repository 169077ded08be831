//! llm-proxy - Authenticating streaming proxy for LLM vendor APIs
//!
//! Forwards `/openai/*` and `/anthropic/*` requests to the configured
//! upstreams, swapping the shared proxy token for the vendor credential and
//! streaming bodies through unchanged.

pub mod config;
pub mod error;
pub mod middleware;
pub mod proxy;
pub mod routes;

use anyhow::Result;

pub use crate::config::Config;
pub use crate::proxy::{Upstream, Upstreams};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    /// Per-vendor targets built from `config`
    pub upstreams: Upstreams,
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Create a new application state
    ///
    /// Fails if a credential can't be sent as a header value or the HTTP
    /// client can't be built.
    pub fn new(config: Config) -> Result<Self> {
        let upstreams = Upstreams::from_config(&config)?;

        // No overall timeout: streamed responses may stay open for minutes.
        // Redirects are relayed to the caller rather than followed.
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            config,
            upstreams,
            http_client,
        })
    }
}
