//! CORS forwarding proxy.
//!
//! Browsers request `/<target-url>` and the proxy forwards to the
//! target, relaying the response with permissive CORS headers,
//! optional credential forwarding (`proxyAuth=true`) and optional body
//! URL rewriting (`rewrite-urls` header).
//!
//! # Architecture Overview
//!
//! ```text
//! incoming request
//!     → http/server.rs   (preflight / landing page / orchestration)
//!     → proxy/target.rs  (target URL + proxy-control params)
//!     → proxy/forwarder.rs (outbound call → response | failure)
//!     → proxy/rewrite.rs (optional body URL rewriting)
//!     → http/headers.rs  (upstream header filter)
//!     → cors             (policy overwrite on every terminal response)
//! ```

pub mod config;
pub mod cors;
pub mod http;
pub mod proxy;

pub use config::ProxyConfig;
pub use cors::CorsPolicy;
pub use http::HttpServer;
