//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Normalize backend addresses into upstream URLs
//! - Validate value ranges (intervals > 0, attempts > 0)
//! - Keep the request timeout above the time retries and failover can take
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::schema::BalancerConfig;
use crate::resilience::RetryPolicy;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,

    #[error("backend {address:?} is not a valid URL: {reason}")]
    InvalidBackendUrl { address: String, reason: String },

    #[error("backend {address:?} uses unsupported scheme {scheme:?} (only http is proxied)")]
    UnsupportedScheme { address: String, scheme: String },

    #[error("backend {address:?} has no host")]
    MissingHost { address: String },

    #[error("backend {address:?} is configured more than once")]
    DuplicateBackend { address: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("timeouts.request_secs ({request_secs}s) must exceed the worst-case routing time ({required:?})")]
    RequestBudget { request_secs: u64, required: Duration },
}

/// Parse a configured backend address into its normalized upstream URL.
///
/// Bare `host:port` values are treated as `http://host:port`. Query and
/// fragment are dropped; a path, if present, becomes a prefix for every
/// forwarded request.
pub fn normalize_backend_url(address: &str) -> Result<Url, ValidationError> {
    let trimmed = address.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let mut url = Url::parse(&candidate).map_err(|e| ValidationError::InvalidBackendUrl {
        address: address.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" {
        return Err(ValidationError::UnsupportedScheme {
            address: address.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::MissingHost {
            address: address.to_string(),
        });
    }

    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Normalize every configured backend, collecting all failures.
pub fn backend_urls(config: &BalancerConfig) -> Result<Vec<Url>, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    let mut urls = Vec::with_capacity(config.backends.len());

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    for address in &config.backends {
        match normalize_backend_url(address) {
            Ok(url) => {
                if !seen.insert(url.clone()) {
                    errors.push(ValidationError::DuplicateBackend {
                        address: address.clone(),
                    });
                    continue;
                }
                urls.push(url);
            }
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(urls)
    } else {
        Err(errors)
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = match backend_urls(config) {
        Ok(_) => Vec::new(),
        Err(errors) => errors,
    };

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "health_check.interval_secs" });
    }
    if config.health_check.probe_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "health_check.probe_timeout_secs" });
    }
    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::Zero { field: "retries.max_attempts" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.connect_secs" });
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.upstream_secs" });
    }

    let required = RetryPolicy::from_config(&config.retries)
        .worst_case(Duration::from_secs(config.timeouts.upstream_secs));
    if config.timeouts.request_secs > 0 && Duration::from_secs(config.timeouts.request_secs) <= required {
        errors.push(ValidationError::RequestBudget {
            request_secs: config.timeouts.request_secs,
            required,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(backends: &[&str]) -> BalancerConfig {
        BalancerConfig {
            backends: backends.iter().map(|b| b.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn normalizes_bare_host_port() {
        let url = normalize_backend_url("localhost:8081").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8081/");
    }

    #[test]
    fn drops_query_and_fragment() {
        let url = normalize_backend_url("http://10.0.0.1:9000/api?x=1#top").unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.1:9000/api");
    }

    #[test]
    fn rejects_https() {
        let err = normalize_backend_url("https://example.com").unwrap_err();
        assert!(matches!(err, ValidationError::UnsupportedScheme { .. }));
    }

    #[test]
    fn rejects_garbage() {
        let err = normalize_backend_url("http://[::1").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBackendUrl { .. }));
    }

    #[test]
    fn empty_backend_list_is_an_error() {
        let errors = validate_config(&config_with(&[])).unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoBackends]);
    }

    #[test]
    fn duplicates_are_detected_after_normalization() {
        let errors = validate_config(&config_with(&["127.0.0.1:8081", "http://127.0.0.1:8081"]))
            .unwrap_err();
        assert!(matches!(errors[0], ValidationError::DuplicateBackend { .. }));
    }

    #[test]
    fn collects_every_error() {
        let mut config = config_with(&["https://a.example", "ftp://b.example"]);
        config.health_check.interval_secs = 0;
        config.retries.max_attempts = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn default_limits_are_valid() {
        assert!(validate_config(&config_with(&["http://127.0.0.1:8081"])).is_ok());
    }

    #[test]
    fn zero_connect_timeout_is_rejected() {
        let mut config = config_with(&["http://127.0.0.1:8081"]);
        config.timeouts.connect_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::Zero { field: "timeouts.connect_secs" }]);
    }

    #[test]
    fn request_timeout_must_outlast_retries() {
        let mut config = config_with(&["http://127.0.0.1:8081"]);
        config.timeouts.request_secs = 2;
        config.timeouts.upstream_secs = 2;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::RequestBudget {
                request_secs: 2,
                required: Duration::from_millis(24_090),
            }]
        );

        config.timeouts.request_secs = 25;
        assert!(validate_config(&config).is_ok());
    }
}
