//! HTTP server setup and request orchestration.
//!
//! # Responsibilities
//! - Create the Axum Router with the wildcard proxy route
//! - Wire up middleware (tracing, timeout, request ID)
//! - Answer preflight requests and serve the landing page
//! - Drive a request through resolve → forward → respond, applying the
//!   CORS policy on every terminal response

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{self, HeaderMap, HeaderValue},
        request::Parts,
        Method, Request, StatusCode,
    },
    response::Response,
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::cors::CorsPolicy;
use crate::http::headers::filter_response_headers;
use crate::proxy::{rewrite, target, Forwarder};

/// Request header whose presence enables body URL rewriting.
pub const REWRITE_URLS_HEADER: &str = "rewrite-urls";

const DEFAULT_LANDING_PAGE: &str = include_str!("../../static/index.html");

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<CorsPolicy>,
    pub forwarder: Forwarder,
    pub landing_page: Arc<String>,
    pub config: Arc<ProxyConfig>,
}

/// Error constructing the server at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read landing page: {0}")]
    LandingPage(#[from] std::io::Error),

    #[error("failed to build outbound client: {0}")]
    Client(#[from] reqwest::Error),
}

/// HTTP server for the CORS proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, StartupError> {
        let landing_page = match &config.landing_page {
            Some(path) => std::fs::read_to_string(path)?,
            None => DEFAULT_LANDING_PAGE.to_string(),
        };

        let forwarder = Forwarder::new(Duration::from_secs(config.timeouts.upstream_secs))?;

        let state = AppState {
            policy: Arc::new(CorsPolicy::new()),
            forwarder,
            landing_page: Arc::new(landing_page),
            config: Arc::new(config.clone()),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    // TimeoutLayer::new is deprecated in tower-http 0.6 but keeps the
    // 408 behavior we want; its replacement changes the constructor
    // signature.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
///
/// Per request: `RECEIVED → RESOLVING → {SERVING_LANDING | FORWARDING}
/// → {SUCCEEDED | FAILED} → RESPONDED`, with the OPTIONS preflight
/// short-circuiting straight to the response.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let origin = parts.headers.get(header::ORIGIN).cloned();

    if parts.method == Method::OPTIONS {
        tracing::debug!(path = %parts.uri.path(), "answering preflight");
        return terminal(&state, origin, StatusCode::OK, HeaderMap::new(), Body::empty());
    }

    if parts.method != Method::GET && parts.method != Method::HEAD && parts.method != Method::POST
    {
        return terminal(
            &state,
            origin,
            StatusCode::METHOD_NOT_ALLOWED,
            HeaderMap::new(),
            Body::empty(),
        );
    }

    let target = target::resolve(parts.uri.path(), parts.uri.query());

    if target.is_landing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
        let body = Body::from(state.landing_page.as_str().to_owned());
        return terminal(&state, origin, StatusCode::OK, headers, body);
    }

    tracing::info!(
        method = %parts.method,
        target_url = %target.target_url,
        proxy_auth = target.proxy_auth,
        "forwarding request"
    );

    let outcome = if parts.method == Method::POST {
        let body_bytes =
            match axum::body::to_bytes(body, state.config.limits.max_body_bytes).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    tracing::warn!(
                        target_url = %target.target_url,
                        limit = state.config.limits.max_body_bytes,
                        "request body over limit, not forwarding"
                    );
                    return terminal(
                        &state,
                        origin,
                        StatusCode::PAYLOAD_TOO_LARGE,
                        HeaderMap::new(),
                        Body::empty(),
                    );
                }
            };
        state
            .forwarder
            .forward_post(&target, &parts.headers, body_bytes)
            .await
    } else {
        state.forwarder.forward_get(&target, &parts.headers).await
    };

    match outcome {
        Ok(origin_response) => {
            let headers = filter_response_headers(&origin_response.headers);
            let body = if parts.headers.contains_key(REWRITE_URLS_HEADER) {
                let host = proxy_host(&state, &parts);
                let text = String::from_utf8_lossy(&origin_response.body);
                Body::from(rewrite::rewrite(&text, &target.target_url, &host))
            } else {
                Body::from(origin_response.body)
            };
            terminal(&state, origin, origin_response.status, headers, body)
        }
        Err(failure) => {
            tracing::warn!(
                status = %failure.status,
                target_url = %target.target_url,
                "forwarding failed"
            );
            let headers = filter_response_headers(&failure.headers);
            terminal(
                &state,
                origin,
                failure.status,
                headers,
                Body::from(failure.message),
            )
        }
    }
}

/// Build a terminal response. Every exit path goes through here so the
/// CORS policy is applied regardless of how the request was handled.
fn terminal(
    state: &AppState,
    origin: Option<HeaderValue>,
    status: StatusCode,
    mut headers: HeaderMap,
    body: Body,
) -> Response {
    state.policy.apply(&mut headers, origin.as_ref());
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Host the browser should use to reach this proxy, used when
/// rewriting body URLs.
fn proxy_host(state: &AppState, parts: &Parts) -> String {
    if let Some(host) = &state.config.public_host {
        return host.clone();
    }
    parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string())
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
