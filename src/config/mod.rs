//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + CLI flags
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, backend URL normalization)
//!     → BalancerConfig (validated, immutable)
//!     → handed to the server at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend set is fixed at startup
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{parse_config, read_config, ConfigError};
pub use schema::{
    BackoffStrategy, BalancerConfig, HealthCheckConfig, LimitsConfig, ListenerConfig,
    ObservabilityConfig, RetryConfig, TimeoutConfig,
};
pub use validation::{backend_urls, normalize_backend_url, validate_config, ValidationError};
