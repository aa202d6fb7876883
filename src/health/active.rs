//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend with a TCP connect
//! - Mark reachable backends alive and unreachable ones dead
//!
//! # Design Decisions
//! - A probe is a bare connect; no HTTP exchange, no status interpretation
//! - Probes of one round run concurrently, each with its own deadline
//! - First round fires one interval after start; missed ticks are skipped

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use url::Url;

use crate::config::HealthCheckConfig;
use crate::load_balancer::ServerPool;

pub struct HealthMonitor {
    pool: Arc<ServerPool>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(pool: Arc<ServerPool>, config: HealthCheckConfig) -> Self {
        Self { pool, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval_secs = self.config.interval_secs,
            probe_timeout_secs = self.config.probe_timeout_secs,
            "Health monitor starting"
        );

        let interval = self.config.interval();
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::info!("Initiating health check");
                    check_health(&self.pool, self.config.probe_timeout()).await;
                    tracing::info!(
                        alive = self.pool.alive_count(),
                        total = self.pool.len(),
                        "Completed health check"
                    );
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}

/// Probe every backend once and record the result on its liveness flag.
pub async fn check_health(pool: &ServerPool, probe_timeout: Duration) {
    let mut probes = JoinSet::new();

    for backend in pool.backends() {
        let backend = backend.clone();
        probes.spawn(async move {
            let alive = is_backend_alive(backend.url(), probe_timeout).await;
            backend.set_alive(alive);
            let status = if alive { "up" } else { "down" };
            tracing::info!(backend = %backend.url(), status, "Health probe");
        });
    }

    while let Some(result) = probes.join_next().await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Health probe task failed");
        }
    }
}

/// True if a TCP connection to the backend's host and port succeeds in time.
pub async fn is_backend_alive(url: &Url, probe_timeout: Duration) -> bool {
    let (Some(host), Some(port)) = (url.host_str(), url.port_or_known_default()) else {
        tracing::warn!(backend = %url, "Backend URL has no host or port to probe");
        return false;
    };
    let address = format!("{}:{}", host, port);

    match time::timeout(probe_timeout, TcpStream::connect(&address)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            tracing::warn!(backend = %url, error = %e, "Unable to reach server");
            false
        }
        Err(_) => {
            tracing::warn!(backend = %url, timeout = ?probe_timeout, "Unable to reach server: timeout");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::load_balancer::forwarder::testing::ScriptedForwarder;
    use tokio::net::TcpListener;

    const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

    async fn listening_url() -> (TcpListener, Url) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
        (listener, url)
    }

    async fn closed_url() -> Url {
        let (listener, url) = listening_url().await;
        drop(listener);
        url
    }

    fn pool_of(urls: Vec<Url>) -> Arc<ServerPool> {
        Arc::new(ServerPool::from_urls(urls, ScriptedForwarder::new()))
    }

    #[tokio::test]
    async fn probe_detects_listener() {
        let (_listener, url) = listening_url().await;
        assert!(is_backend_alive(&url, PROBE_TIMEOUT).await);
    }

    #[tokio::test]
    async fn probe_detects_closed_port() {
        let url = closed_url().await;
        assert!(!is_backend_alive(&url, PROBE_TIMEOUT).await);
    }

    #[tokio::test]
    async fn round_updates_every_backend() {
        let (_listener, up) = listening_url().await;
        let down = closed_url().await;
        let pool = pool_of(vec![up.clone(), down.clone()]);

        pool.mark_backend_status(&up, false);
        check_health(&pool, PROBE_TIMEOUT).await;

        assert!(pool.backends()[0].is_alive());
        assert!(!pool.backends()[1].is_alive());
    }

    #[tokio::test]
    async fn monitor_heals_backend_without_traffic() {
        let down = closed_url().await;
        let pool = pool_of(vec![down.clone()]);
        pool.mark_backend_status(&down, false);

        // Backend comes back on the same port.
        let addr = format!("{}:{}", down.host_str().unwrap(), down.port().unwrap());
        let _listener = TcpListener::bind(addr).await.unwrap();

        let config = HealthCheckConfig {
            enabled: true,
            interval_secs: 1,
            probe_timeout_secs: 1,
        };
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(HealthMonitor::new(pool.clone(), config).run(shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(pool.backends()[0].is_alive());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor should stop on shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn disabled_monitor_returns_immediately() {
        let pool = pool_of(vec![closed_url().await]);
        let config = HealthCheckConfig {
            enabled: false,
            ..Default::default()
        };
        let shutdown = Shutdown::new();

        tokio::time::timeout(
            Duration::from_millis(100),
            HealthMonitor::new(pool.clone(), config).run(shutdown.subscribe()),
        )
        .await
        .unwrap();
        assert!(pool.backends()[0].is_alive());
    }
}
