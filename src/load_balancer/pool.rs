//! Backend pool management.
//!
//! # Responsibilities
//! - Hold the ordered, fixed set of backends
//! - Select the next live backend in round-robin order
//! - Apply liveness updates by backend URL

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use url::Url;

use crate::load_balancer::{backend::Backend, forwarder::Forwarder};

/// Ordered collection of backends plus a shared rotation cursor.
#[derive(Debug, Default)]
pub struct ServerPool {
    backends: Vec<Arc<Backend>>,
    cursor: AtomicU64,
}

impl ServerPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool with one backend per URL, all sharing `forwarder`.
    pub fn from_urls(urls: impl IntoIterator<Item = Url>, forwarder: Arc<dyn Forwarder>) -> Self {
        let mut pool = Self::new();
        for url in urls {
            tracing::info!(backend = %url, "Configured server");
            pool.add_backend(Backend::new(url, forwarder.clone()));
        }
        pool
    }

    /// Append a backend. Rotation follows insertion order.
    pub fn add_backend(&mut self, backend: Backend) {
        self.backends.push(Arc::new(backend));
    }

    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Number of backends currently flagged alive.
    pub fn alive_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_alive()).count()
    }

    /// Advance the cursor and return where the next scan starts.
    ///
    /// # Panics
    /// Panics on an empty pool; startup validation rejects empty backend lists.
    pub fn next_index(&self) -> usize {
        let len = self.backends.len() as u64;
        let cursor = self.cursor.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        (cursor % len) as usize
    }

    /// Select the next live backend, or `None` when every backend is down.
    ///
    /// The scan covers one full cycle starting at `next_index()`. When the
    /// chosen backend is not the one the cursor pointed at, the cursor is
    /// parked on it so later scans skip the dead stretch.
    pub fn get_next_peer(&self) -> Option<Arc<Backend>> {
        if self.backends.is_empty() {
            return None;
        }

        let len = self.backends.len();
        let next = self.next_index();

        for i in next..next + len {
            let idx = i % len;
            let backend = &self.backends[idx];
            if backend.is_alive() {
                if i != next {
                    self.cursor.store(idx as u64, Ordering::Relaxed);
                }
                return Some(backend.clone());
            }
        }

        tracing::debug!(backend_count = len, "No live backend in pool");
        None
    }

    /// Set the liveness of the backend with the given URL.
    ///
    /// Returns `false` when no backend matches.
    pub fn mark_backend_status(&self, url: &Url, alive: bool) -> bool {
        match self.backends.iter().find(|b| b.url() == url) {
            Some(backend) => {
                backend.set_alive(alive);
                true
            }
            None => false,
        }
    }
}
