//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forward to backend fails:
//!     → retries.rs (same-backend retry left? attempts left?)
//!     → backoff.rs (delay before the next same-backend retry)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every forward and probe has a deadline
//! - Retry/attempt ceilings bound worst-case latency per request
//! - Policy is plain data; the router owns the state machine

pub mod backoff;
pub mod retries;

pub use retries::RetryPolicy;
