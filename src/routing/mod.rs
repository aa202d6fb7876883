//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Buffered client request
//!     → router.rs (select peer, forward, retry, fail over)
//!     → context.rs (attempt/retry counters carried by value)
//!     → Return: backend response or RouteError (503)
//! ```
//!
//! # Design Decisions
//! - One state machine per request; no shared routing state beyond the pool
//! - Counters are an explicit value, never stored on backends or the pool
//! - Iterative re-entry instead of recursion keeps the future size fixed

pub mod context;
pub mod router;

pub use context::RequestContext;
pub use router::{RouteError, Routed, Router};
