//! Forwarding pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! incoming path + query
//!     → target.rs (extract target URL, strip proxy-control params)
//!     → forwarder.rs (fresh outbound headers, credential policy,
//!       outbound call → OriginResponse | ProxyFailure)
//!     → rewrite.rs (optional relative→absolute→proxied URL rewrite)
//!     → http/server.rs (merge headers, apply CORS policy, respond)
//! ```

pub mod forwarder;
pub mod rewrite;
pub mod target;

pub use forwarder::{Forwarder, OriginResponse, ProxyFailure};
pub use target::TargetRequest;
