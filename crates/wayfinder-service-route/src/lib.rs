//! Indoor route planning HTTP service.
//!
//! # Endpoints
//!
//! - `POST /api/v1/route` - Compute a route between two labelled locations
//! - `GET /api/v1/locations` - Selectable locations grouped by category
//! - `POST /admin/reload` - Re-read the building database (only when enabled)
//! - `GET /metrics` - Prometheus metrics endpoint
//! - `GET /health/live` - Kubernetes liveness probe
//! - `GET /health/ready` - Kubernetes readiness probe
//!
//! # Configuration
//!
//! - `WAYFINDER_DATA_PATH` - Building database (default: `/data/building.db`)
//! - `SERVICE_PORT` - HTTP port (default: 5001)
//! - `WAYFINDER_SEARCH_TIMEOUT_MS` - Per-request search budget (default: 2000)
//! - `WAYFINDER_ADMIN_ENABLED` - Mount `/admin/reload` (default: false)
//! - `RUST_LOG`, `LOG_FORMAT`, `METRICS_ENABLED` - see `wayfinder-service-shared`

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use wayfinder_lib::{
    Geometry, LocationCatalog, RouteResult, RouteSegment, compute_route, list_locations,
};
use wayfinder_service_shared::{
    AppState, AppStateError, DEFAULT_SEARCH_TIMEOUT, MetricsLayer, ProblemDetails, RouteRequest,
    ServiceResponse, SnapshotSummary, Validate, error_reason, extract_or_generate_request_id,
    from_lib_error, health_live, health_ready, metrics_handler, record_route_calculated,
    record_route_failed, record_route_segments, record_snapshot_reload,
};

pub const DEFAULT_DATA_PATH: &str = "/data/building.db";
pub const DEFAULT_PORT: u16 = 5001;

/// Service settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub data_path: PathBuf,
    pub port: u16,
    pub search_timeout: Duration,
    /// Expose `POST /admin/reload`.
    pub admin_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            port: DEFAULT_PORT,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            admin_enabled: false,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparsable values fall back to
    /// their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let data_path = lookup("WAYFINDER_DATA_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_path);
        let port = parse_or(&lookup, "SERVICE_PORT", defaults.port);
        let search_timeout = Duration::from_millis(parse_or(
            &lookup,
            "WAYFINDER_SEARCH_TIMEOUT_MS",
            defaults.search_timeout.as_millis() as u64,
        ));
        let admin_enabled = parse_or(&lookup, "WAYFINDER_ADMIN_ENABLED", defaults.admin_enabled);

        Self {
            data_path,
            port,
            search_timeout,
            admin_enabled,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default = %default, "ignoring unparsable setting");
            default
        }),
        None => default,
    }
}

/// Route response returned to the caller.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    /// Effective cost the route was selected on.
    pub distance: f64,
    /// Same path priced without the stairs penalty.
    pub base_distance: f64,
    pub start_point: Geometry,
    pub end_point: Geometry,
    pub start_floor: i32,
    pub end_floor: i32,
    pub start_label: String,
    pub end_label: String,
    /// Floors in visiting order.
    pub floors: Vec<i32>,
    pub segments: Vec<RouteSegment>,
}

impl From<RouteResult> for RouteResponse {
    fn from(route: RouteResult) -> Self {
        let floors = route.floors();
        Self {
            distance: route.total_cost,
            base_distance: route.base_cost,
            start_point: route.start_point,
            end_point: route.end_point,
            start_floor: route.start_floor,
            end_floor: route.end_floor,
            start_label: route.start_label,
            end_label: route.end_label,
            floors,
            segments: route.segments,
        }
    }
}

/// HTTP response - either success or RFC 9457 error.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response<T> {
    Success(ServiceResponse<T>),
    Error(ProblemDetails),
}

impl<T: Serialize> IntoResponse for Response<T> {
    fn into_response(self) -> axum::response::Response {
        match self {
            Response::Success(data) => (StatusCode::OK, Json(data)).into_response(),
            Response::Error(problem) => problem.into_response(),
        }
    }
}

/// Build the service router around a loaded state.
///
/// Only the `/api/v1` routes are open to cross-origin browsers. The reload
/// route is mounted when `admin_enabled` is set, without CORS.
pub fn app(state: AppState, admin_enabled: bool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let api = Router::new()
        .route("/api/v1/route", post(route_handler))
        .route("/api/v1/locations", get(locations_handler))
        .layer(cors);

    let mut router = Router::new()
        .merge(api)
        .route("/metrics", get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready));
    if admin_enabled {
        router = router.route("/admin/reload", post(reload_handler));
    }

    router.layer(MetricsLayer).with_state(state)
}

/// Handle POST /api/v1/route requests.
async fn route_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Response<RouteResponse> {
    let request_id = extract_or_generate_request_id(&headers).0;

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            record_route_failed("validation_error");
            return Response::Error(ProblemDetails::bad_request(
                rejection.body_text(),
                &request_id,
            ));
        }
    };

    info!(
        request_id = %request_id,
        start = %request.start,
        end = %request.end,
        avoid_stairs = request.avoid_stairs,
        "handling route request"
    );

    if let Err(problem) = request.validate(&request_id) {
        record_route_failed("validation_error");
        return Response::Error(*problem);
    }

    let building = state.snapshot();
    let lib_request = request.to_lib_request(state.search_budget());
    let outcome =
        tokio::task::spawn_blocking(move || compute_route(&building, &lib_request)).await;

    let route = match outcome {
        Ok(Ok(route)) => route,
        Ok(Err(e)) => {
            warn!(request_id = %request_id, error = %e, "route computation failed");
            record_route_failed(error_reason(&e));
            return Response::Error(from_lib_error(&e, &request_id));
        }
        Err(e) => {
            error!(request_id = %request_id, error = %e, "route computation task aborted");
            record_route_failed("internal");
            return Response::Error(ProblemDetails::internal_error(
                "route computation aborted",
                &request_id,
            ));
        }
    };

    record_route_calculated(request.avoid_stairs);
    record_route_segments(route.segment_count());

    info!(
        request_id = %request_id,
        distance = route.total_cost,
        segments = route.segment_count(),
        start_floor = route.start_floor,
        end_floor = route.end_floor,
        "route computed successfully"
    );

    let body = ServiceResponse::new(RouteResponse::from(route)).with_request_id(request_id);
    Response::Success(body)
}

/// Handle GET /api/v1/locations requests.
async fn locations_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response<LocationCatalog> {
    let request_id = extract_or_generate_request_id(&headers).0;
    let catalog = list_locations(&state.snapshot());
    Response::Success(ServiceResponse::new(catalog).with_request_id(request_id))
}

/// Handle POST /admin/reload requests.
async fn reload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response<SnapshotSummary> {
    let request_id = extract_or_generate_request_id(&headers).0;

    // Browsers attach Origin to cross-site POSTs, including the ones CORS
    // never preflights. Operators call this from curl or a sidecar.
    if headers.contains_key(header::ORIGIN) {
        warn!(request_id = %request_id, "rejected browser-originated reload");
        return Response::Error(ProblemDetails::forbidden(
            "Snapshot reloads cannot be triggered from a browser",
            &request_id,
        ));
    }

    let outcome = tokio::task::spawn_blocking(move || state.reload()).await;
    let problem = match outcome {
        Ok(Ok(summary)) => {
            record_snapshot_reload(true);
            return Response::Success(ServiceResponse::new(summary).with_request_id(request_id));
        }
        Ok(Err(AppStateError::BuildingLoad(e))) => from_lib_error(&e, &request_id),
        Ok(Err(e @ AppStateError::DatabaseNotFound(_)))
        | Ok(Err(e @ AppStateError::ReloadUnavailable)) => {
            ProblemDetails::service_unavailable(e.to_string(), &request_id)
        }
        Err(e) => ProblemDetails::internal_error(e.to_string(), &request_id),
    };

    warn!(request_id = %request_id, problem = %problem, "snapshot reload failed");
    record_snapshot_reload(false);
    Response::Error(problem)
}
