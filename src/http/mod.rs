//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → request.rs (buffer body, strip hop-by-hop, X-Forwarded-For)
//!     → [routing layer picks backend, retries, fails over]
//!     → response.rs (strip hop-by-hop, stream body, or 503)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, ProxyRequest, X_REQUEST_ID};
pub use server::HttpServer;
