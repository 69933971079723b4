//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with every forwarding route
//! - Wire up middleware (tracing, timeout, body limits, request ID)
//! - Hold the shared state (config snapshot + upstream client)
//! - Apply hot config reloads via atomic snapshot swap
//! - Serve with graceful shutdown, plain TCP or TLS

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::gateway::UpstreamClient;
use crate::http::request::RequestIdLayer;
use crate::net::tls::load_tls_config;
use crate::observability::metrics;
use crate::routes;

/// Application state injected into handlers.
///
/// The config lives behind an atomic snapshot so a reload never tears an
/// in-flight request; each handler reads one coherent snapshot.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ArcSwap<GatewayConfig>>,
    pub client: UpstreamClient,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        let client = UpstreamClient::new(&config.timeouts);
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            client,
        }
    }

    /// The current config snapshot.
    pub fn config(&self) -> Arc<GatewayConfig> {
        self.config.load_full()
    }

    /// Swap in a freshly validated config.
    pub fn apply_config(&self, config: GatewayConfig) {
        self.config.store(Arc::new(config));
    }
}

/// HTTP server for the forwarding gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let state = AppState::new(config.clone());
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/health", get(health))
            .nest("/api", routes::api_router())
            .fallback(path_not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .layer(middleware::from_fn(track_metrics))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Config updates arriving on `config_updates` are swapped into the
    /// shared snapshot; listener settings require a restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                tracing::info!(
                    upstream = %new_config.upstream.base_url,
                    "Applying reloaded configuration"
                );
                state.apply_config(new_config);
            }
        });

        if let Some(tls) = &self.config.listener.tls {
            let rustls_config =
                load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
            let handle = axum_server::Handle::new();
            let shutdown_handle = handle.clone();
            tokio::spawn(async move {
                let _ = shutdown.recv().await;
                shutdown_handle.graceful_shutdown(Some(Duration::from_secs(30)));
            });

            let std_listener = listener.into_std()?;
            axum_server::from_tcp_rustls(std_listener, rustls_config)
                .handle(handle)
                .serve(self.router.into_make_service())
                .await?;
        } else {
            axum::serve(listener, self.router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await?;
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config the server was built with.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Local liveness probe; never touches the upstream.
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Unknown path under the gateway.
async fn path_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": "path not found"})),
    )
}

/// Record route family, method, status, and latency for every inbound
/// request.
async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let family = request
        .uri()
        .path()
        .strip_prefix("/api/")
        .and_then(|rest| rest.split('/').next())
        .unwrap_or("root")
        .to_string();
    let response = next.run(request).await;
    metrics::record_request(&family, &method, response.status().as_u16(), start);
    response
}
