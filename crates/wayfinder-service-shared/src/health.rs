//! Health check handlers for Kubernetes probes.
//!
//! `/health/live` answers as long as the process runs. `/health/ready` also
//! reports what the current building snapshot holds and fails when it holds
//! nothing routable.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health status response for liveness and readiness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status indicator: "ok" or "not_ready: <reason>".
    pub status: String,

    pub service: String,

    pub version: String,

    /// Nodes in the current snapshot (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes_loaded: Option<usize>,

    /// Locations in the current snapshot (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations_loaded: Option<usize>,

    /// When the current snapshot was loaded (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_loaded_at: Option<DateTime<Utc>>,
}

impl HealthStatus {
    /// Create a healthy liveness status.
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            nodes_loaded: None,
            locations_loaded: None,
            snapshot_loaded_at: None,
        }
    }

    /// Create a ready status describing the loaded snapshot.
    pub fn ready(
        service: &str,
        version: &str,
        nodes: usize,
        locations: usize,
        loaded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            nodes_loaded: Some(nodes),
            locations_loaded: Some(locations),
            snapshot_loaded_at: Some(loaded_at),
            ..Self::alive(service, version)
        }
    }

    /// Create a not-ready status.
    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            ..Self::alive(service, version)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Liveness probe handler.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"wayfinder-service-shared","version":"0.1.0"}
/// ```
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness probe handler.
///
/// Returns 503 when the snapshot has no nodes or no locations, since no
/// route request could succeed against it.
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let status = readiness(&state);
    let code = if status.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status)).into_response()
}

fn readiness(state: &AppState) -> HealthStatus {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    let summary = state.summary();

    if summary.nodes == 0 {
        return HealthStatus::not_ready(service, version, "no nodes loaded");
    }
    if summary.locations == 0 {
        return HealthStatus::not_ready(service, version, "no locations loaded");
    }

    HealthStatus::ready(
        service,
        version,
        summary.nodes,
        summary.locations,
        summary.loaded_at,
    )
}
