//! Upstream forwarding.
//!
//! # Responsibilities
//! - Send a buffered client request to one backend
//! - Report transport failures as errors instead of writing a response
//!
//! # Design Decisions
//! - One pooled HTTP client shared by every backend
//! - Only transport-level failures are errors; any HTTP status from the
//!   backend (5xx included) is a successful forward
//! - Each forward has its own deadline so a hung backend counts as a failure

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use url::Url;

use crate::config::TimeoutConfig;
use crate::http::request::ProxyRequest;
use crate::http::response;

/// Why a forward to a backend did not produce a response.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The outgoing request could not be built.
    #[error("failed to build upstream request: {0}")]
    Build(#[from] axum::http::Error),

    /// Connection refused, reset, DNS failure and the like.
    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    /// The backend did not answer in time.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),
}

/// Performs the HTTP exchange with a backend.
#[async_trait]
pub trait Forwarder: Send + Sync {
    async fn forward(
        &self,
        target: &Url,
        request: &ProxyRequest,
    ) -> Result<Response<Body>, ForwardError>;
}

/// Forwarder backed by a pooled `hyper-util` client.
#[derive(Clone)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
    upstream_timeout: Duration,
}

impl HttpForwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        }
    }
}

#[async_trait]
impl Forwarder for HttpForwarder {
    async fn forward(
        &self,
        target: &Url,
        request: &ProxyRequest,
    ) -> Result<Response<Body>, ForwardError> {
        let upstream = request.to_upstream(target)?;

        match tokio::time::timeout(self.upstream_timeout, self.client.request(upstream)).await {
            Ok(Ok(resp)) => Ok(response::from_upstream(resp)),
            Ok(Err(e)) => Err(ForwardError::Request(e)),
            Err(_) => Err(ForwardError::Timeout(self.upstream_timeout)),
        }
    }
}
