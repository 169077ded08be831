//! Upstream selection and URL reconstruction
//!
//! Maps an inbound path prefix to one of the two vendor APIs and rebuilds the
//! URL the request is forwarded to.

use std::borrow::Cow;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Url;

use crate::config::Config;

/// Header carrying the Anthropic API key
pub const X_API_KEY: HeaderName = HeaderName::from_static("x-api-key");
/// Header carrying the Anthropic API version
pub const ANTHROPIC_VERSION: HeaderName = HeaderName::from_static("anthropic-version");

/// The vendor APIs the proxy can forward to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    OpenAI,
    Anthropic,
}

impl Upstream {
    /// Evaluated in order when matching a path
    pub const ALL: [Upstream; 2] = [Upstream::OpenAI, Upstream::Anthropic];

    /// Path prefix routed to this upstream, without the trailing slash
    pub fn prefix(self) -> &'static str {
        match self {
            Upstream::OpenAI => "/openai",
            Upstream::Anthropic => "/anthropic",
        }
    }

    /// Name used in logs
    pub fn name(self) -> &'static str {
        match self {
            Upstream::OpenAI => "openai",
            Upstream::Anthropic => "anthropic",
        }
    }

    /// Select the upstream whose prefix (followed by `/`) starts `path`.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|upstream| {
            path.strip_prefix(upstream.prefix())
                .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// The part of `path` left after removing this upstream's prefix
    pub fn relative_path(self, path: &str) -> &str {
        path.strip_prefix(self.prefix()).unwrap_or(path)
    }
}

/// Rebuild the upstream URL for a forwarded request.
///
/// The base URL's own path is kept (minus one trailing slash) and the
/// relative path appended to it, so bases mounted under a path such as
/// `https://host/v2` are neither lost nor doubled. The inbound query is
/// attached verbatim and any fragment is dropped.
pub fn build_upstream_url(base: &Url, relative_path: &str, query: Option<&str>) -> Url {
    let relative: Cow<'_, str> = if relative_path.starts_with('/') {
        Cow::Borrowed(relative_path)
    } else {
        Cow::Owned(format!("/{}", relative_path))
    };

    let base_path = base.path();
    let base_path = base_path.strip_suffix('/').unwrap_or(base_path);

    let combined = if base_path.is_empty() || base_path == "/" {
        relative.into_owned()
    } else {
        format!("{}{}", base_path, relative)
    };

    let mut url = base.clone();
    url.set_path(&combined);
    url.set_query(query.filter(|q| !q.is_empty()));
    url.set_fragment(None);
    url
}

/// Runtime settings for one upstream, validated once at startup
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    upstream: Upstream,
    base_url: Url,
    credential: (HeaderName, HeaderValue),
    default_version: Option<HeaderValue>,
}

impl UpstreamTarget {
    /// OpenAI target: bearer credential, no extra headers
    pub fn openai(config: &Config) -> Result<Self> {
        let credential = sensitive_value(&format!("Bearer {}", config.openai_api_key))
            .context("OPENAI_API_KEY is not a valid header value")?;

        Ok(Self {
            upstream: Upstream::OpenAI,
            base_url: config.openai_base_url.clone(),
            credential: (AUTHORIZATION, credential),
            default_version: None,
        })
    }

    /// Anthropic target: `x-api-key` credential plus optional default version
    pub fn anthropic(config: &Config) -> Result<Self> {
        let credential = sensitive_value(&config.anthropic_api_key)
            .context("ANTHROPIC_API_KEY is not a valid header value")?;
        let default_version = config
            .anthropic_version
            .as_deref()
            .map(HeaderValue::from_str)
            .transpose()
            .context("ANTHROPIC_VERSION is not a valid header value")?;

        Ok(Self {
            upstream: Upstream::Anthropic,
            base_url: config.anthropic_base_url.clone(),
            credential: (X_API_KEY, credential),
            default_version,
        })
    }

    pub fn upstream(&self) -> Upstream {
        self.upstream
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full upstream URL for an inbound path and query
    pub fn url_for(&self, inbound_path: &str, query: Option<&str>) -> Url {
        build_upstream_url(
            &self.base_url,
            self.upstream.relative_path(inbound_path),
            query,
        )
    }

    /// Inject vendor credentials into already filtered outbound headers.
    ///
    /// `inbound` is the unfiltered header set of the original request; a
    /// non-empty `anthropic-version` supplied there is never overridden. An
    /// empty one counts as missing.
    pub fn apply_credentials(&self, outbound: &mut HeaderMap, inbound: &HeaderMap) {
        let (name, value) = &self.credential;
        outbound.insert(name.clone(), value.clone());

        if let Some(version) = &self.default_version {
            let supplied = inbound
                .get(&ANTHROPIC_VERSION)
                .is_some_and(|v| !v.is_empty());
            if !supplied {
                outbound.insert(ANTHROPIC_VERSION, version.clone());
            }
        }
    }
}

fn sensitive_value(raw: &str) -> Result<HeaderValue, reqwest::header::InvalidHeaderValue> {
    let mut value = HeaderValue::from_str(raw)?;
    value.set_sensitive(true);
    Ok(value)
}

/// Both upstream targets, built from configuration at startup
#[derive(Debug, Clone)]
pub struct Upstreams {
    openai: UpstreamTarget,
    anthropic: UpstreamTarget,
}

impl Upstreams {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            openai: UpstreamTarget::openai(config)?,
            anthropic: UpstreamTarget::anthropic(config)?,
        })
    }

    pub fn get(&self, upstream: Upstream) -> &UpstreamTarget {
        match upstream {
            Upstream::OpenAI => &self.openai,
            Upstream::Anthropic => &self.anthropic,
        }
    }
}
