//! Delay between same-backend retries.

use rand::Rng;
use std::time::Duration;

use crate::config::BackoffStrategy;

/// Constant delay for every retry.
pub fn fixed_backoff(attempt: u32, delay_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }
    Duration::from_millis(delay_ms)
}

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Delay before retry number `attempt` (1-based) under `strategy`.
pub fn delay_for(strategy: BackoffStrategy, attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    match strategy {
        BackoffStrategy::Fixed => fixed_backoff(attempt, base_ms),
        BackoffStrategy::Exponential => calculate_backoff(attempt, base_ms, max_ms),
    }
}

/// Longest delay `delay_for` can return for `attempt`, jitter included.
pub fn delay_ceiling(strategy: BackoffStrategy, attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    match strategy {
        BackoffStrategy::Fixed => fixed_backoff(attempt, base_ms),
        BackoffStrategy::Exponential if attempt == 0 => Duration::ZERO,
        BackoffStrategy::Exponential => {
            let capped = base_ms
                .saturating_mul(2u64.saturating_pow(attempt - 1))
                .min(max_ms);
            Duration::from_millis(capped + capped / 10)
        }
    }
}
