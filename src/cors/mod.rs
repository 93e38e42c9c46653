//! CORS header policy.
//!
//! # Responsibilities
//! - Hold the static CORS header set built once at startup
//! - Compute `Access-Control-Allow-Origin` from the caller's `Origin`
//! - Overwrite any conflicting header on the outgoing response
//!
//! # Design Decisions
//! - The static portion is immutable and shared; only the allow-origin
//!   value varies per request
//! - The same policy is applied on the success, failure, landing and
//!   preflight paths

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Headers a browser may send through the proxy and read back from it.
pub const ALLOW_HEADERS: &str = "x-requested-with, Content-Type, origin, authorization, accept, client-security-token, cache-control, if-none-match, if-not-modified, x-api-key, x-trip-id, accept-language, accept-encoding, x-total-count, pragma, expires, X-Atlassian-Token";

/// Methods the proxy answers for.
pub const ALLOW_METHODS: &str = "OPTIONS,HEAD,GET,POST";

/// Preflight cache lifetime in seconds (one day).
pub const MAX_AGE_SECS: &str = "86400";

/// Marker header identifying responses that went through this proxy.
pub const PROXIED_BY: &str = "cors-container";

/// The CORS header set applied to every response.
///
/// Construct once at startup and share via the application state.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    static_headers: Vec<(HeaderName, HeaderValue)>,
}

impl CorsPolicy {
    pub fn new() -> Self {
        let static_headers = vec![
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS),
            ),
            (
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                HeaderValue::from_static(ALLOW_HEADERS),
            ),
            (
                header::ACCESS_CONTROL_MAX_AGE,
                HeaderValue::from_static(MAX_AGE_SECS),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static(ALLOW_METHODS),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            ),
            (
                HeaderName::from_static("x-proxied-by"),
                HeaderValue::from_static(PROXIED_BY),
            ),
        ];
        Self { static_headers }
    }

    /// Merge the CORS header set into `headers`, overwriting conflicts.
    ///
    /// `Access-Control-Allow-Origin` echoes the caller's `Origin` when
    /// present and non-empty, otherwise `*`.
    pub fn apply(&self, headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
        for (name, value) in &self.static_headers {
            headers.insert(name.clone(), value.clone());
        }
        let allow_origin = origin
            .filter(|v| !v.as_bytes().is_empty())
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new()
    }
}
