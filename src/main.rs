//! rr-balancer
//!
//! Round-robin HTTP load balancer with retry, failover and health checks.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http::server ──▶ routing::router ──▶ load_balancer::pool
//!                                         │   ▲                 │
//!                          retry / fail   │   │ next live peer  │
//!                          over           ▼   │                 ▼
//!     Client Response                 backend forward ◀──── Backend (alive?)
//!     ◀──────────────────────────────────────┘                  ▲
//!                                                               │
//!                               health::active (periodic TCP probe)
//! ```

use clap::Parser;
use std::path::PathBuf;

use rr_balancer::config::{read_config, BalancerConfig};
use rr_balancer::lifecycle::{signals, startup, Shutdown};
use rr_balancer::observability::init_logging;

#[derive(Parser)]
#[command(name = "rr-balancer")]
#[command(about = "Round-robin HTTP load balancer", long_about = None)]
struct Cli {
    /// Comma-separated backend URLs (e.g. http://127.0.0.1:8081,http://127.0.0.1:8082)
    #[arg(short, long, value_delimiter = ',')]
    backends: Vec<String>,

    /// Port to serve traffic on
    #[arg(short, long)]
    port: Option<u16>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Start from the config file (or defaults) and apply flags on top.
    fn into_config(self) -> Result<BalancerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => BalancerConfig::default(),
        };

        if !self.backends.is_empty() {
            config.backends = self.backends;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    init_logging(&config.observability);

    tracing::info!(
        port = config.listener.port,
        backends = config.backends.len(),
        health_check_interval_secs = config.health_check.interval_secs,
        max_retries = config.retries.max_retries,
        max_attempts = config.retries.max_attempts,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    if let Err(e) = startup::start(config, &shutdown).await {
        tracing::error!(error = %e, "Load balancer failed");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
