//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server
//! - Track liveness (alive/dead) shared by the router and the health monitor
//! - Delegate forwarding to the associated forwarder

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::Response;
use url::Url;

use crate::http::request::ProxyRequest;
use crate::load_balancer::forwarder::{ForwardError, Forwarder};

/// A single backend server.
pub struct Backend {
    /// Normalized upstream URL; also the lookup key.
    url: Url,
    /// Liveness flag. Readers never block; writes are single stores.
    alive: AtomicBool,
    /// Performs the actual forward to `url`.
    forwarder: Arc<dyn Forwarder>,
}

impl Backend {
    /// Create a new backend. Backends start out alive.
    pub fn new(url: Url, forwarder: Arc<dyn Forwarder>) -> Self {
        Self {
            url,
            alive: AtomicBool::new(true),
            forwarder,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Release);
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Forward a request to this backend.
    ///
    /// Nothing is sent to the client on failure; the caller decides whether
    /// to retry, fail over or give up.
    pub async fn forward(&self, request: &ProxyRequest) -> Result<Response<Body>, ForwardError> {
        self.forwarder.forward(&self.url, request).await
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("url", &self.url.as_str())
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::forwarder::testing::ScriptedForwarder;
    use axum::http::{Method, Uri};

    fn backend(addr: &str) -> Backend {
        Backend::new(Url::parse(addr).unwrap(), ScriptedForwarder::new())
    }

    #[test]
    fn starts_alive() {
        assert!(backend("http://127.0.0.1:8080").is_alive());
    }

    #[test]
    fn liveness_toggles() {
        let b = backend("http://127.0.0.1:8080");
        b.set_alive(false);
        assert!(!b.is_alive());
        b.set_alive(true);
        assert!(b.is_alive());
    }

    #[test]
    fn concurrent_readers_see_latest_write() {
        let b = Arc::new(backend("http://127.0.0.1:8080"));
        b.set_alive(false);

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let b = b.clone();
                std::thread::spawn(move || b.is_alive())
            })
            .collect();

        for reader in readers {
            assert!(!reader.join().unwrap());
        }
    }

    #[tokio::test]
    async fn forward_targets_own_url() {
        let forwarder = ScriptedForwarder::new();
        let b = Backend::new(Url::parse("http://10.0.0.1:80").unwrap(), forwarder.clone());
        let request = ProxyRequest::new(Method::GET, Uri::from_static("/"));

        let response = b.forward(&request).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(forwarder.calls(b.url()), 1);
    }

    #[tokio::test]
    async fn forward_failure_leaves_liveness_untouched() {
        let forwarder = ScriptedForwarder::new();
        let b = Backend::new(Url::parse("http://10.0.0.1:80").unwrap(), forwarder.clone());
        forwarder.always_fail(b.url());
        let request = ProxyRequest::new(Method::GET, Uri::from_static("/"));

        assert!(b.forward(&request).await.is_err());
        assert!(b.is_alive());
    }
}
