//! Response body URL rewriting.
//!
//! # Responsibilities
//! - Convert relative references in a text body to absolute URLs
//!   resolved against the target URL
//! - Route absolute target-origin URLs back through this proxy
//!
//! # Design Decisions
//! - Textual transform over the full body; suitable for HTML/CSS/JS
//!   payloads, binary bodies are not a design target
//! - Scans `href`/`src`/`action` attributes and CSS `url(...)` values

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

static ATTR_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(href|src|action)\s*=\s*(["'])([^"']*)(["'])"#).unwrap()
});

static CSS_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\burl\(\s*(["']?)([^"')]+)(["']?)\s*\)"#).unwrap());

/// Rewrite `body` so URLs pointing at the target resolve through the
/// proxy at `proxy_host`.
///
/// Relative references are first made absolute against `target_url`;
/// every occurrence of the target's origin is then prefixed with
/// `//<proxy_host>/` so the browser's follow-up requests route back
/// through the proxy.
pub fn rewrite(body: &str, target_url: &str, proxy_host: &str) -> String {
    match Url::parse(target_url) {
        Ok(base) => {
            let origin = base.origin().ascii_serialization();
            if origin == "null" {
                // Opaque origin (non-hierarchical scheme); only the
                // literal target URL can be re-routed.
                return body.replace(target_url, &format!("//{}/{}", proxy_host, target_url));
            }
            let absolute = to_absolute(body, &base);
            absolute.replace(&origin, &format!("//{}/{}", proxy_host, origin))
        }
        Err(_) => body.replace(target_url, &format!("//{}/{}", proxy_host, target_url)),
    }
}

fn to_absolute(body: &str, base: &Url) -> String {
    let attrs = ATTR_URL.replace_all(body, |caps: &Captures| {
        format!(
            "{}={}{}{}",
            &caps[1],
            &caps[2],
            resolve_reference(base, &caps[3]),
            &caps[4]
        )
    });
    CSS_URL
        .replace_all(&attrs, |caps: &Captures| {
            format!(
                "url({}{}{})",
                &caps[1],
                resolve_reference(base, &caps[2]),
                &caps[3]
            )
        })
        .into_owned()
}

fn resolve_reference(base: &Url, reference: &str) -> String {
    let trimmed = reference.trim();
    if trimmed.is_empty()
        || trimmed.contains("://")
        || trimmed.starts_with("//")
        || trimmed.starts_with('#')
        || trimmed.starts_with("data:")
        || trimmed.starts_with("mailto:")
        || trimmed.starts_with("javascript:")
    {
        return reference.to_string();
    }
    base.join(trimmed)
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| reference.to_string())
}
