//! Prometheus metrics for wayfinder services.
//!
//! # Example
//!
//! ```no_run
//! use wayfinder_service_shared::metrics::{MetricsConfig, init_metrics, metrics_handler};
//! use axum::{Router, routing::get};
//!
//! init_metrics(&MetricsConfig::default()).expect("failed to initialize metrics");
//! let app: Router = Router::new().route("/metrics", get(metrics_handler));
//! ```

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub const ROUTES_CALCULATED: &str = "wayfinder_routes_calculated_total";
pub const ROUTES_FAILED: &str = "wayfinder_routes_failed_total";
pub const ROUTE_SEGMENTS: &str = "wayfinder_route_segments";
pub const SNAPSHOT_RELOADS: &str = "wayfinder_snapshot_reloads_total";

/// Configuration for the metrics system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Path for the metrics endpoint.
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Create configuration from environment variables.
    ///
    /// - `METRICS_ENABLED`: "false" disables collection (default: true)
    /// - `METRICS_PATH`: endpoint path (default: "/metrics")
    pub fn from_env() -> Self {
        let enabled = std::env::var("METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        let path = std::env::var("METRICS_PATH").unwrap_or_else(|_| "/metrics".to_string());

        Self { enabled, path }
    }
}

/// Install the Prometheus recorder.
///
/// # Errors
///
/// Fails when metrics are disabled, when a recorder is already installed, or
/// when the exporter cannot be built.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    metrics::describe_counter!(ROUTES_CALCULATED, "Routes computed successfully");
    metrics::describe_counter!(ROUTES_FAILED, "Route requests that failed, by reason");
    metrics::describe_histogram!(ROUTE_SEGMENTS, "Segments per computed route");
    metrics::describe_counter!(SNAPSHOT_RELOADS, "Building snapshot reloads, by outcome");
}

/// Returns `None` if [`init_metrics`] has not been called.
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Axum handler for the `/metrics` endpoint.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

/// Errors that can occur during metrics initialization.
#[derive(Debug, Clone)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Business Metrics Helpers
// =============================================================================

/// Count a successful route, labelled by whether stairs were avoided.
pub fn record_route_calculated(avoid_stairs: bool) {
    metrics::counter!(ROUTES_CALCULATED, "avoid_stairs" => avoid_stairs.to_string()).increment(1);
}

/// Count a failed route request.
///
/// `reason` is one of the short labels from [`crate::error_reason`] or
/// `"validation_error"`.
pub fn record_route_failed(reason: &'static str) {
    metrics::counter!(ROUTES_FAILED, "reason" => reason).increment(1);
}

/// Record how many segments a computed route has.
pub fn record_route_segments(segments: usize) {
    metrics::histogram!(ROUTE_SEGMENTS).record(segments as f64);
}

/// Count a snapshot reload attempt.
pub fn record_snapshot_reload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(SNAPSHOT_RELOADS, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_config_default() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.path, "/metrics");
    }

    #[test]
    fn test_disabled_config_is_rejected() {
        let config = MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        };
        assert!(matches!(init_metrics(&config), Err(MetricsError::Disabled)));
    }

    #[tokio::test]
    async fn test_metrics_handler_returns_prometheus_format() {
        let output = metrics_handler().await;
        // Either real exposition text or the "not initialized" comment.
        assert!(output.contains('#') || output.is_empty());
    }

    #[test]
    fn test_business_helpers_without_recorder() {
        // Without an installed recorder these are no-ops; they must not panic.
        record_route_calculated(true);
        record_route_calculated(false);
        record_route_failed("no_route");
        record_route_segments(4);
        record_snapshot_reload(true);
    }

    #[test]
    fn test_metrics_error_display() {
        assert_eq!(MetricsError::Disabled.to_string(), "metrics are disabled");
        assert_eq!(
            MetricsError::AlreadyInitialized.to_string(),
            "metrics recorder already initialized"
        );
        let failed = MetricsError::InstallFailed("port in use".to_string());
        assert!(failed.to_string().contains("port in use"));
    }
}
