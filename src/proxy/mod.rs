//! Proxy module
//!
//! Handles request forwarding to the upstream vendor APIs.

pub mod forward;
pub mod headers;
pub mod logging;
pub mod upstream;

pub use forward::forward_request;
pub use logging::RequestContext;
pub use upstream::{build_upstream_url, Upstream, UpstreamTarget, Upstreams};
