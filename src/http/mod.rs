//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, preflight, landing page, orchestration)
//!     → proxy layer resolves target and issues the outbound call
//!     → headers.rs (filter upstream headers for the browser)
//!     → cors policy overwrite
//!     → Send to client
//! ```

pub mod headers;
pub mod server;

pub use server::{AppState, HttpServer, StartupError, REWRITE_URLS_HEADER};
