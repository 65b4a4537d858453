//! Auction engine HTTP server.
//!
//! Server-owned bidding engine with CAS bid commits, per-auction clocks, and
//! idempotent settlement recording.

use gavel::{AppState, AuctionEngine, Config, build_router};
use gavel_core::environment::SystemClock;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present, then initialize tracing
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gavel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting auction engine HTTP server");

    // Load configuration
    let config = Config::from_env();
    info!(
        host = %config.server.host,
        port = config.server.port,
        default_duration_secs = config.engine.default_auction_duration_secs,
        grace_window_secs = config.engine.grace_window_secs,
        "Configuration loaded"
    );

    // Metrics: register descriptions and expose a Prometheus scrape endpoint
    gavel::metrics::register_engine_metrics();
    let metrics_addr: SocketAddr =
        format!("{}:{}", config.server.metrics_host, config.server.metrics_port).parse()?;
    if let Err(error) = metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
    {
        warn!(%error, "Failed to install Prometheus exporter, metrics disabled");
    } else {
        info!(address = %metrics_addr, "Prometheus exporter listening");
    }

    // Build the engine
    let engine = AuctionEngine::new(&config.engine, Arc::new(SystemClock));
    let state = AppState::new(engine.clone());

    // Build router and serve
    let app = build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let in-flight clock effects (closures, settlements) finish
    let timeout = std::time::Duration::from_secs(config.server.shutdown_timeout);
    if let Err(error) = engine.shutdown(timeout).await {
        warn!(%error, "Engine shutdown incomplete");
    }

    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for Ctrl+C (SIGINT) or SIGTERM.
#[allow(clippy::expect_used)] // Failing to install signal handlers is unrecoverable
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
