//! Request routing with retry and failover.
//!
//! # Responsibilities
//! - Pick a live backend for each request
//! - Retry transient forwarding failures against the same backend
//! - Mark a backend down once its retries are spent and fail over
//! - Stop with an explicit error when the pool or the attempt budget is exhausted
//!
//! # State Machine
//! ```text
//! Routing ──peer──▶ Forwarding ──ok──▶ Success
//!    ▲                  │
//!    │             err, retries left ──delay──▶ Forwarding (same backend)
//!    │                  │
//!    └── failed over ◀──┘ err, retries spent (backend marked down)
//!
//! Routing ──attempts > max / no live peer──▶ Unavailable
//! ```

use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;
use thiserror::Error;
use url::Url;

use crate::http::request::ProxyRequest;
use crate::load_balancer::{Backend, ServerPool};
use crate::resilience::RetryPolicy;
use crate::routing::context::RequestContext;

/// Terminal routing failures. Both map to 503 for the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("max attempts reached ({attempts})")]
    AttemptsExhausted { attempts: u32 },

    #[error("no live backend available (attempt {attempts})")]
    NoPeerAvailable { attempts: u32 },
}

/// A request that reached a backend and got a response.
#[derive(Debug)]
pub struct Routed {
    pub response: Response<Body>,
    /// Backend that produced the response.
    pub backend: Url,
    /// Counters as they stood when the response arrived.
    pub context: RequestContext,
}

/// Per-request entry point into the pool.
#[derive(Debug, Clone)]
pub struct Router {
    pool: Arc<ServerPool>,
    policy: RetryPolicy,
}

impl Router {
    pub fn new(pool: Arc<ServerPool>, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &Arc<ServerPool> {
        &self.pool
    }

    /// Route a fresh request.
    pub async fn route(&self, request: &ProxyRequest) -> Result<Routed, RouteError> {
        self.route_with(request, RequestContext::new()).await
    }

    /// Route a request whose counters are already in `ctx`.
    pub async fn route_with(
        &self,
        request: &ProxyRequest,
        mut ctx: RequestContext,
    ) -> Result<Routed, RouteError> {
        loop {
            if self.policy.attempts_exhausted(ctx.attempts) {
                tracing::warn!(
                    path = %request.path(),
                    attempts = ctx.attempts,
                    "Max attempts reached, terminating"
                );
                return Err(RouteError::AttemptsExhausted { attempts: ctx.attempts });
            }

            let Some(peer) = self.pool.get_next_peer() else {
                tracing::warn!(
                    path = %request.path(),
                    attempts = ctx.attempts,
                    "No live backend available"
                );
                return Err(RouteError::NoPeerAvailable { attempts: ctx.attempts });
            };

            match self.forward_with_retries(&peer, request, ctx).await {
                Ok((response, ctx)) => {
                    return Ok(Routed {
                        response,
                        backend: peer.url().clone(),
                        context: ctx,
                    });
                }
                Err(spent) => {
                    self.pool.mark_backend_status(peer.url(), false);
                    tracing::warn!(
                        backend = %peer.url(),
                        path = %request.path(),
                        attempts = spent.attempts,
                        "Backend marked down, failing over"
                    );
                    ctx = spent.failed_over();
                }
            }
        }
    }

    /// Forward to one backend, retrying in place while retries remain.
    ///
    /// On failure, returns the context with this backend's retries spent.
    async fn forward_with_retries(
        &self,
        peer: &Backend,
        request: &ProxyRequest,
        mut ctx: RequestContext,
    ) -> Result<(Response<Body>, RequestContext), RequestContext> {
        loop {
            match peer.forward(request).await {
                Ok(response) => return Ok((response, ctx)),
                Err(e) => {
                    tracing::warn!(
                        backend = %peer.url(),
                        error = %e,
                        retries = ctx.retries,
                        "Forward failed"
                    );

                    if !self.policy.should_retry(ctx.retries) {
                        return Err(ctx);
                    }

                    ctx = ctx.retried();
                    tokio::time::sleep(self.policy.retry_delay(ctx.retries)).await;
                }
            }
        }
    }
}
