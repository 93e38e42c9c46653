//! Outbound request construction and execution.
//!
//! # Responsibilities
//! - Build a fresh outbound header map (never inherited wholesale from
//!   the incoming request)
//! - Apply the credential-forwarding policy
//! - Surface every outcome as either an `OriginResponse` or a
//!   `ProxyFailure`; this layer never panics and never returns a bare
//!   transport error
//!
//! # Design Decisions
//! - GET forwards `Authorization` only when the caller opted in with
//!   `proxyAuth=true`; POST forwards it whenever present
//! - A bounded timeout is set on the shared client so a stalled target
//!   cannot pin resources indefinitely

use std::time::Duration;

use axum::body::Bytes;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::StatusCode;

use crate::proxy::target::TargetRequest;

/// User-Agent sent on every outbound request.
pub const USER_AGENT: &str = "CorsContainer";

/// Content type assumed for POST bodies when the caller sent none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A complete response from the target origin. Request-scoped; consumed
/// by the orchestrator and discarded once the response is sent.
#[derive(Debug)]
pub struct OriginResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A failed forwarding attempt: transport errors and non-success
/// upstream statuses, surfaced uniformly.
#[derive(Debug)]
pub struct ProxyFailure {
    /// Upstream status, or 500 when the target never answered.
    pub status: StatusCode,
    /// Upstream headers; empty for transport failures.
    pub headers: HeaderMap,
    /// Upstream body or transport error text.
    pub message: String,
}

impl ProxyFailure {
    fn from_transport(err: reqwest::Error) -> Self {
        Self {
            status: err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            headers: HeaderMap::new(),
            message: err.to_string(),
        }
    }
}

/// Issues outbound requests to forwarding targets.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Forward a GET (or HEAD) request to the target.
    pub async fn forward_get(
        &self,
        target: &TargetRequest,
        incoming: &HeaderMap,
    ) -> Result<OriginResponse, ProxyFailure> {
        let mut request = self.client.get(target.outbound_url());
        if target.proxy_auth {
            if let Some(auth) = incoming.get(header::AUTHORIZATION) {
                tracing::debug!(target_url = %target.target_url, "forwarding Authorization header to target");
                request = request.header(header::AUTHORIZATION, auth);
            }
        }
        self.execute(request).await
    }

    /// Forward a POST request, re-serializing a JSON body.
    pub async fn forward_post(
        &self,
        target: &TargetRequest,
        incoming: &HeaderMap,
        body: Bytes,
    ) -> Result<OriginResponse, ProxyFailure> {
        let content_type = incoming
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

        let mut request = self
            .client
            .post(target.outbound_url())
            .header("x-atlassian-token", "no-check")
            .header(header::CONTENT_TYPE, content_type)
            .body(normalize_json_body(body));
        if let Some(auth) = incoming.get(header::AUTHORIZATION) {
            request = request.header(header::AUTHORIZATION, auth);
        }
        self.execute(request).await
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<OriginResponse, ProxyFailure> {
        let response = request.send().await.map_err(ProxyFailure::from_transport)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(ProxyFailure::from_transport)?;

        if status.is_success() {
            Ok(OriginResponse {
                status,
                headers,
                body,
            })
        } else {
            Err(ProxyFailure {
                status,
                headers,
                message: String::from_utf8_lossy(&body).into_owned(),
            })
        }
    }
}

/// Re-serialize a JSON body into its canonical compact form. Bodies
/// that are not valid JSON are forwarded verbatim.
fn normalize_json_body(body: Bytes) -> Bytes {
    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(value) => match serde_json::to_vec(&value) {
            Ok(serialized) => Bytes::from(serialized),
            Err(_) => body,
        },
        Err(_) => body,
    }
}
