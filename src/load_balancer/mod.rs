//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Router asks for a peer
//!     → pool.rs (advance atomic cursor, scan one cycle for a live backend)
//!     → backend.rs (liveness flag + forward)
//!     → forwarder.rs (HTTP exchange with the upstream)
//!     → Response, or ForwardError for the router to handle
//! ```
//!
//! # Design Decisions
//! - Backend set is fixed at startup; only liveness changes at runtime
//! - Selection is lock-free: one atomic increment plus liveness loads
//! - Dead backends are skipped, never removed

pub mod backend;
pub mod forwarder;
pub mod pool;

pub use backend::Backend;
pub use forwarder::{ForwardError, Forwarder, HttpForwarder};
pub use pool::ServerPool;
