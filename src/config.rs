//! Configuration management for llm-proxy
//!
//! Configuration is loaded once from environment variables at startup and
//! never changes afterwards.

use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use std::env;

/// Default listening port when `PORT` is not set
pub const DEFAULT_PORT: u16 = 33000;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// OpenAI upstream base URL
    pub openai_base_url: Url,
    /// OpenAI API key, sent as `Authorization: Bearer`
    pub openai_api_key: String,

    /// Anthropic upstream base URL
    pub anthropic_base_url: Url,
    /// Anthropic API key, sent as `x-api-key`
    pub anthropic_api_key: String,
    /// Default `anthropic-version` for requests that don't carry one
    pub anthropic_version: Option<String>,

    /// Bearer token every inbound caller must present
    pub proxy_token: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// Empty values are treated the same as missing ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| anyhow!("Missing required env: {}", name))
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT: {}", raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,

            openai_base_url: parse_base_url("OPENAI_BASE_URL", &require("OPENAI_BASE_URL")?)?,
            openai_api_key: require("OPENAI_API_KEY")?,

            anthropic_base_url: parse_base_url(
                "ANTHROPIC_BASE_URL",
                &require("ANTHROPIC_BASE_URL")?,
            )?,
            anthropic_api_key: require("ANTHROPIC_API_KEY")?,
            anthropic_version: get("ANTHROPIC_VERSION"),

            proxy_token: require("PROXY_TOKEN")?,
        })
    }

    /// Address the server listens on
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_base_url(name: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid {}: {}", name, raw))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("Invalid {}: {} is not a base URL", name, raw));
    }
    Ok(url)
}
