//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → TCP probe of each backend
//!     → Backend liveness flag (up/down)
//!
//! Passive failure detection (routing::router):
//!     Forward fails after all same-backend retries
//!     → Backend marked down
//!     → Only the next active probe brings it back
//! ```
//!
//! # Design Decisions
//! - Active and passive checks are complementary
//! - Probe results overwrite the flag directly; no hysteresis
//! - Health state is per-backend, not per-pool

pub mod active;

pub use active::{check_health, is_backend_alive, HealthMonitor};
