//! Target URL resolution from the incoming request path.
//!
//! # Responsibilities
//! - Extract the target URL embedded in the request path
//! - Pull proxy-control parameters out of the query string
//! - Re-serialize the remaining query for forwarding

use url::form_urlencoded;

/// Query parameter that opts the GET path into Authorization
/// forwarding. Never relayed to the target.
pub const PROXY_AUTH_PARAM: &str = "proxyAuth";

/// A resolved forwarding target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRequest {
    /// Everything after the leading `/` of the request path, unmodified.
    /// Expected to be a full URL, e.g. `http://example.com/page`.
    pub target_url: String,

    /// The incoming query string with proxy-control parameters removed.
    pub forwarded_query: String,

    /// Whether the caller asked for Authorization forwarding with
    /// `proxyAuth=true` (literal, case-sensitive).
    pub proxy_auth: bool,
}

impl TargetRequest {
    /// An empty target means the proxy's own root was requested; the
    /// orchestrator serves the landing page instead of forwarding.
    pub fn is_landing(&self) -> bool {
        self.target_url.is_empty()
    }

    /// The URL the outbound request is issued against.
    ///
    /// The forwarded query joins with `&` when the target already
    /// carries its own query, and nothing is appended when the
    /// forwarded query is empty.
    pub fn outbound_url(&self) -> String {
        if self.forwarded_query.is_empty() {
            self.target_url.clone()
        } else if self.target_url.contains('?') {
            format!("{}&{}", self.target_url, self.forwarded_query)
        } else {
            format!("{}?{}", self.target_url, self.forwarded_query)
        }
    }
}

/// Split the incoming path and query into a forwarding target.
///
/// Key/value pairs and multiplicity of the query are preserved; every
/// `proxyAuth` pair is removed.
pub fn resolve(path: &str, raw_query: Option<&str>) -> TargetRequest {
    let target_url = path.strip_prefix('/').unwrap_or(path).to_string();

    let mut proxy_auth = false;
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(raw_query.unwrap_or("").as_bytes()) {
        if key == PROXY_AUTH_PARAM {
            if value == "true" {
                proxy_auth = true;
            }
            continue;
        }
        serializer.append_pair(&key, &value);
    }

    TargetRequest {
        target_url,
        forwarded_query: serializer.finish(),
        proxy_auth,
    }
}
