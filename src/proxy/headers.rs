//! Header filtering for proxied requests and responses
//!
//! The same filter runs on the headers sent upstream and on the upstream's
//! response headers before they are relayed. The inbound `Authorization`
//! header carries the proxy token and must never reach a vendor.

use axum::http::header::{self, HeaderName};
use reqwest::header::HeaderMap;

/// Headers dropped in both directions
const STRIPPED_HEADERS: &[HeaderName] = &[
    header::HOST,
    header::CONTENT_LENGTH,
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::AUTHORIZATION,
];

/// Check if a header is dropped when forwarding
///
/// `HeaderName` is always stored lowercase, so this comparison is
/// case-insensitive with respect to what was on the wire.
pub fn is_stripped_header(name: &HeaderName) -> bool {
    STRIPPED_HEADERS.contains(name)
}

/// Copy every header except the stripped ones.
///
/// Repeated headers keep all their values, in order.
pub fn filter_headers(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());

    for (name, value) in headers {
        if !is_stripped_header(name) {
            filtered.append(name.clone(), value.clone());
        }
    }

    filtered
}
