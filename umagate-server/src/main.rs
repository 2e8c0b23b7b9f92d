//! UMA Gate HTTP Server binary

use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};
use umagate_core::GateBuilder;
use umagate_server::{config::ServerConfig, proxy::Upstream, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize OpenTelemetry tracing
    let enable_otel = std::env::var("OTEL_ENABLED")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    if enable_otel {
        umagate_server::tracing::init_tracing_stack("umagate-server")?;
        info!("OpenTelemetry tracing enabled");
    } else {
        umagate_server::tracing::init_console()?;
        info!("Console logging enabled (set OTEL_ENABLED=true for OpenTelemetry)");
    }

    info!("Starting UMA Gate server v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics
    umagate_server::metrics::init_prometheus()?;
    umagate_server::metrics::init_metrics();

    // Load configuration from file and environment
    let config_path = std::env::var("UMAGATE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("umagate.toml"));
    if !config_path.exists() {
        warn!(path = %config_path.display(), "Config file not found, using environment only");
    }
    let config = ServerConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    // A gate with missing settings still starts; it reports degraded and rejects requests
    let gate = GateBuilder::new().config(config.gate.clone()).build()?;
    umagate_server::metrics::set_degraded(!gate.health().is_healthy());

    let upstream_url = config
        .server
        .upstream_url
        .clone()
        .context("No upstream configured (set [server].upstream_url or UMAGATE_UPSTREAM_URL)")?;
    let upstream = Upstream::new(&upstream_url, config.server.max_body_bytes)?;
    info!(upstream = %upstream_url, "Relaying authorized requests");

    // Gate in front of the relay, operational routes beside it
    let app = router::build(AppState::new(gate), upstream.into_router());

    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address))?;

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Set up shutdown signal handler
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal, shutting down gracefully...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    // Cleanup OpenTelemetry on shutdown
    if enable_otel {
        info!("Flushing OpenTelemetry traces...");
        umagate_server::tracing::shutdown_telemetry();
    }

    info!("Server shutdown complete");
    Ok(())
}
