//! EasyMed backend forwarding gateway (binary entrypoint).
//!
//! ```text
//!                        ┌───────────────────────────────────────────┐
//!                        │                 GATEWAY                    │
//!   Browser request      │  ┌─────────┐   ┌─────────┐   ┌─────────┐  │
//!   ────────────────────▶│  │  http   │──▶│ routes  │──▶│ gateway │──┼──▶ Upstream
//!                        │  │ server  │   │ catalog │   │ upstream│  │    REST backend
//!   Browser response     │  └─────────┘   └─────────┘   └─────────┘  │
//!   ◀────────────────────┼───────── status + body relayed ───────────┼──◀
//!                        │                                            │
//!                        │  config reload · metrics · graceful stop   │
//!                        └───────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use easymed_gateway::config::loader::load_config;
use easymed_gateway::config::watcher::ConfigWatcher;
use easymed_gateway::config::GatewayConfig;
use easymed_gateway::http::HttpServer;
use easymed_gateway::lifecycle::{signals, Shutdown};
use easymed_gateway::observability::metrics;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Forwarding gateway between the EasyMed browser app and its backend.
#[derive(Debug, Parser)]
#[command(name = "easymed-gateway", version)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listener bind address, overriding the config file.
    #[arg(long, env = "GATEWAY_BIND")]
    bind: Option<String>,

    /// Upstream backend origin, overriding the config file.
    #[arg(long = "upstream-url", env = "BACKEND_BASE_URL")]
    upstream_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(upstream_url) = cli.upstream_url {
        config.upstream.base_url = upstream_url;
    }
    easymed_gateway::config::validation::validate_config(&config)
        .map_err(easymed_gateway::config::loader::ConfigError::Validation)?;

    // RUST_LOG wins; the configured level is the fallback.
    let default_filter = format!(
        "easymed_gateway={},tower_http=warn",
        config.observability.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "easymed-gateway starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    // Metrics exporter, on its own listener.
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Config hot reload; the watcher handle must stay alive for the
    // process lifetime or notify stops delivering events.
    let (config_updates, _watcher) = match &cli.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            (rx, Some(handle))
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (rx, None)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config);
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
