//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (backend, attempts, request_id)
//!     → logging.rs installs the subscriber that writes them to stdout
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than formatted strings
//! - Request ID flows through every request log line

pub mod logging;

pub use logging::init_logging;
