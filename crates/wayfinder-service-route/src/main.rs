//! Indoor route planning HTTP service binary.
//!
//! See the library docs for endpoints and configuration.

use std::net::SocketAddr;

use tracing::{error, info};

use wayfinder_service_route::{ServiceConfig, app};
use wayfinder_service_shared::{
    AppState, LoggingConfig, MetricsConfig, init_logging, init_metrics,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("route");
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        // Metrics are optional.
        tracing::warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let config = ServiceConfig::from_env();
    info!(
        data_path = %config.data_path.display(),
        port = config.port,
        search_timeout_ms = config.search_timeout.as_millis() as u64,
        admin_enabled = config.admin_enabled,
        "starting route service"
    );

    let state = AppState::load(&config.data_path, config.search_timeout).map_err(|e| {
        error!(error = %e, path = %config.data_path.display(), "failed to load application state");
        e
    })?;

    let summary = state.summary();
    info!(
        nodes = summary.nodes,
        locations = summary.locations,
        edges = summary.edges,
        "application state loaded"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state, config.admin_enabled))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("route service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
