//! Retry and failover limits.
//!
//! # Responsibilities
//! - Decide whether a failed forward is retried against the same backend
//! - Decide whether a request may make another routing decision
//! - Produce the delay before each same-backend retry
//!
//! # Design Decisions
//! - Every transport error is treated as transient until the retry ceiling
//! - Two ceilings: retries per backend, attempts (failovers) per request
//! - Limits come from configuration; nothing is adaptive

use std::time::Duration;

use crate::config::{BackoffStrategy, RetryConfig};
use crate::resilience::backoff::{delay_ceiling, delay_for};

/// Limits applied by the router to every request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    max_attempts: u32,
    backoff: BackoffStrategy,
    retry_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            max_attempts: config.max_attempts,
            backoff: config.backoff,
            retry_delay_ms: config.retry_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    /// True while the current backend has retries left.
    pub fn should_retry(&self, retries: u32) -> bool {
        retries < self.max_retries
    }

    /// True once a request has used up its routing decisions.
    pub fn attempts_exhausted(&self, attempts: u32) -> bool {
        attempts > self.max_attempts
    }

    /// Delay before retry number `retry` (1-based) on the same backend.
    pub fn retry_delay(&self, retry: u32) -> Duration {
        delay_for(self.backoff, retry, self.retry_delay_ms, self.max_delay_ms)
    }

    /// Longest a request can spend routing when every forward runs into
    /// the `upstream` deadline: each attempt makes `max_retries + 1` forwards
    /// with the retry delays in between.
    pub fn worst_case(&self, upstream: Duration) -> Duration {
        let forwards = upstream.saturating_mul(self.max_retries.saturating_add(1));
        let per_backend = (1..=self.max_retries)
            .map(|retry| delay_ceiling(self.backoff, retry, self.retry_delay_ms, self.max_delay_ms))
            .fold(forwards, Duration::saturating_add);
        per_backend.saturating_mul(self.max_attempts)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ceilings() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));

        assert!(!policy.attempts_exhausted(1));
        assert!(!policy.attempts_exhausted(3));
        assert!(policy.attempts_exhausted(4));

        assert_eq!(policy.retry_delay(1), Duration::from_millis(10));
    }

    #[test]
    fn zero_retries_fails_over_immediately() {
        let policy = RetryPolicy::from_config(&RetryConfig {
            max_retries: 0,
            ..Default::default()
        });
        assert!(!policy.should_retry(0));
    }

    #[test]
    fn worst_case_covers_every_forward_and_delay() {
        let policy = RetryPolicy::default();
        // 3 attempts x (4 forwards x 5s + 3 x 10ms)
        assert_eq!(
            policy.worst_case(Duration::from_secs(5)),
            Duration::from_millis(60_090)
        );
    }
}
