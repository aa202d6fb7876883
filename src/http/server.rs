//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Buffer inbound requests and hand them to the routing engine
//! - Run the health monitor alongside the server
//! - Shut both down on the shared signal

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use http_body_util::LengthLimitError;
use std::error::Error as _;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{backend_urls, validate_config, BalancerConfig, ConfigError};
use crate::health::HealthMonitor;
use crate::http::request::{MakeRequestUuid, ProxyRequest, X_REQUEST_ID};
use crate::http::response;
use crate::load_balancer::{HttpForwarder, ServerPool};
use crate::resilience::RetryPolicy;
use crate::routing::Router as ProxyRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub max_body_bytes: usize,
}

/// HTTP front end of the load balancer.
pub struct HttpServer {
    router: Router,
    config: BalancerConfig,
    pool: Arc<ServerPool>,
}

impl HttpServer {
    /// Validate the configuration and build one backend per configured URL.
    pub fn new(config: BalancerConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let urls = backend_urls(&config).map_err(ConfigError::Validation)?;

        let forwarder = Arc::new(HttpForwarder::new(&config.timeouts));
        let pool = Arc::new(ServerPool::from_urls(urls, forwarder));

        Ok(Self::with_pool(config, pool))
    }

    /// Build a server around an existing pool. `config.backends` is ignored.
    pub fn with_pool(config: BalancerConfig, pool: Arc<ServerPool>) -> Self {
        let proxy_router = Arc::new(ProxyRouter::new(
            pool.clone(),
            RetryPolicy::from_config(&config.retries),
        ));

        let state = AppState {
            router: proxy_router,
            max_body_bytes: config.limits.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            pool,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &BalancerConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool.len(),
            "Load balancer started"
        );

        let monitor = HealthMonitor::new(self.pool.clone(), self.config.health_check.clone());
        let monitor_task = tokio::spawn(monitor.run(shutdown.resubscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        if let Err(e) = monitor_task.await {
            tracing::error!(error = %e, "Health monitor task failed");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<ServerPool> {
        &self.pool
    }
}

/// Main proxy handler.
/// Buffers the request, routes it, and returns the backend's response or 503.
async fn proxy_handler(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let client = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to buffer request body");
            if exceeds_body_limit(&e) {
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
            }
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    let request = ProxyRequest::from_parts(parts, body, client);

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        path = %request.path(),
        body_bytes = request.body().len(),
        "Proxying request"
    );

    match state.router.route(&request).await {
        Ok(routed) => {
            tracing::debug!(
                request_id = %request_id,
                backend = %routed.backend,
                attempts = routed.context.attempts,
                retries = routed.context.retries,
                status = %routed.response.status(),
                "Request served"
            );
            routed.response
        }
        Err(e) => {
            tracing::warn!(
                request_id = %request_id,
                client = ?client,
                path = %request.path(),
                error = %e,
                "Service not available"
            );
            response::unavailable()
        }
    }
}

/// True when buffering stopped because the body outgrew the limit.
fn exceeds_body_limit(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
