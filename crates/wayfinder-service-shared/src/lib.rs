//! Shared infrastructure for wayfinder HTTP services.
//!
//! - [`AppState`]: the current building snapshot, swappable at runtime
//! - [`health`]: Kubernetes liveness/readiness probes
//! - [`ProblemDetails`]: RFC 9457 error responses
//! - [`ServiceResponse`]: wrapper for successful responses
//! - [`metrics`]: Prometheus recorder and business metric helpers
//! - [`logging`]: structured logging setup
//! - [`middleware`]: request ids and HTTP metrics
//! - [`RouteRequest`]: wire format of a route request, with validation
//!
//! Handlers stay thin. They parse and validate, call into `wayfinder-lib`,
//! and shape the response:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Parse request JSON                                       │
//! │  - Validate parameters                                      │
//! │  - Call wayfinder-lib against an Arc<Building> snapshot     │
//! │  - Format response / ProblemDetails                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Enable the `test-utils` feature to use [`test_utils`] from dependent crates.

#![deny(warnings)]

pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod response;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_route_calculated, record_route_failed,
    record_route_segments, record_snapshot_reload, MetricsConfig, MetricsError,
};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId, REQUEST_ID_HEADER};
pub use problem::{
    error_reason, from_lib_error, ProblemDetails, ProblemKind, PROBLEM_FORBIDDEN,
    PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST, PROBLEM_ROUTE_NOT_FOUND,
    PROBLEM_SEARCH_TIMEOUT, PROBLEM_SERVICE_UNAVAILABLE, PROBLEM_UNKNOWN_LOCATION,
};
pub use request::{PickGeometry, Position, RouteRequest, Validate};
pub use response::ServiceResponse;
pub use state::{AppState, AppStateError, SnapshotSummary, DEFAULT_SEARCH_TIMEOUT};
