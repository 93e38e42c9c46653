//! Upstream response header filtering.
//!
//! # Responsibilities
//! - Decide which upstream headers are safe to relay to the browser
//! - Strip hop-by-hop headers and headers the proxy recomputes
//!
//! # Design Decisions
//! - Deny-list: anything not dropped is relayed verbatim
//! - Applied before the CORS policy overwrite, so CORS headers always
//!   win on conflict

use axum::http::HeaderMap;

/// Headers never relayed from the upstream response.
const DROPPED_HEADERS: &[&str] = &[
    // Hop-by-hop (RFC 9110 §7.6.1)
    "connection",
    "keep-alive",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
    "proxy-authenticate",
    "proxy-authorization",
    // Recomputed by the proxy's own transport
    "content-length",
    "content-encoding",
    // Would break rendering of proxied content in the browser
    "content-security-policy",
    "strict-transport-security",
    "x-frame-options",
];

fn is_dropped(name: &str) -> bool {
    // HeaderName::as_str is always lowercase. The CORS policy owns all
    // access-control-* headers.
    name.starts_with("access-control-") || DROPPED_HEADERS.iter().any(|h| name == *h)
}

/// Produce the subset of upstream headers to merge into the response.
///
/// Pure transform; an empty input yields an empty output.
pub fn filter_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if is_dropped(name.as_str()) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
