//! Per-request routing counters.

/// Counters threaded through one client request's routing.
///
/// Created fresh per request and never shared; the client never sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    /// Routing decisions made so far, starting at 1.
    pub attempts: u32,
    /// Same-backend retries against the current backend, starting at 0.
    pub retries: u32,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            attempts: 1,
            retries: 0,
        }
    }

    /// Context for another forward to the same backend.
    pub fn retried(self) -> Self {
        Self {
            retries: self.retries + 1,
            ..self
        }
    }

    /// Context for a new routing decision after a backend was given up on.
    pub fn failed_over(self) -> Self {
        Self {
            attempts: self.attempts + 1,
            retries: 0,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
