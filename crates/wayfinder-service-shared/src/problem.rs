//! Error bodies in the RFC 9457 "problem details" shape
//! (<https://www.rfc-editor.org/rfc/rfc9457.html>), and the mapping from
//! library errors onto them.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use wayfinder_lib::Error as LibError;

pub const PROBLEM_UNKNOWN_LOCATION: &str = "/problems/unknown-location";
pub const PROBLEM_ROUTE_NOT_FOUND: &str = "/problems/route-not-found";
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";
pub const PROBLEM_SEARCH_TIMEOUT: &str = "/problems/search-timeout";
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";
pub const PROBLEM_FORBIDDEN: &str = "/problems/forbidden";
/// Building database missing or unreadable.
pub const PROBLEM_SERVICE_UNAVAILABLE: &str = "/problems/service-unavailable";

const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// The fixed part of each problem the service can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    InvalidRequest,
    UnknownLocation,
    RouteNotFound,
    SearchTimeout,
    Forbidden,
    Internal,
    Unavailable,
}

impl ProblemKind {
    fn parts(self) -> (&'static str, &'static str, StatusCode) {
        match self {
            Self::InvalidRequest => (
                PROBLEM_INVALID_REQUEST,
                "Invalid Request",
                StatusCode::BAD_REQUEST,
            ),
            Self::UnknownLocation => (
                PROBLEM_UNKNOWN_LOCATION,
                "Unknown Location",
                StatusCode::NOT_FOUND,
            ),
            Self::RouteNotFound => (
                PROBLEM_ROUTE_NOT_FOUND,
                "Route Not Found",
                StatusCode::NOT_FOUND,
            ),
            // A blown budget is load-dependent; clients may retry.
            Self::SearchTimeout => (
                PROBLEM_SEARCH_TIMEOUT,
                "Search Timeout",
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            Self::Forbidden => (PROBLEM_FORBIDDEN, "Forbidden", StatusCode::FORBIDDEN),
            Self::Internal => (
                PROBLEM_INTERNAL_ERROR,
                "Internal Error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            Self::Unavailable => (
                PROBLEM_SERVICE_UNAVAILABLE,
                "Service Unavailable",
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        }
    }

    pub fn status(self) -> StatusCode {
        self.parts().2
    }
}

/// RFC 9457 problem body.
///
/// ```
/// use wayfinder_service_shared::{ProblemDetails, ProblemKind, PROBLEM_UNKNOWN_LOCATION};
///
/// let problem = ProblemDetails::of(
///     ProblemKind::UnknownLocation,
///     "End location 'Restrom' not found",
///     "req-12345",
/// );
/// assert_eq!(problem.type_uri, PROBLEM_UNKNOWN_LOCATION);
/// assert_eq!(problem.status, 404);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// Relative URI naming the problem type.
    #[serde(rename = "type")]
    pub type_uri: String,

    pub title: String,

    pub status: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Request id of the failed call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Extension member: known labels close to an unknown one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,

    pub content_type: String,
}

impl ProblemDetails {
    /// Bare problem without detail or instance.
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            suggestions: Vec::new(),
            content_type: PROBLEM_CONTENT_TYPE.to_string(),
        }
    }

    /// Problem of a known kind, tied to a request.
    pub fn of(kind: ProblemKind, detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        let (type_uri, title, status) = kind.parts();
        Self::new(type_uri, title, status)
            .with_detail(detail)
            .with_request_id(request_id)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::of(ProblemKind::InvalidRequest, detail, request_id)
    }

    /// 404 for an unknown label. `role` is `"Start"` or `"End"`; any fuzzy
    /// matches go both into the detail text and the `suggestions` member.
    pub fn unknown_location(
        role: &str,
        label: &str,
        suggestions: &[String],
        request_id: impl Into<String>,
    ) -> Self {
        let mut detail = format!("{role} location '{label}' not found");
        if !suggestions.is_empty() {
            detail.push_str(&format!(". Did you mean: {}?", suggestions.join(", ")));
        }
        let mut problem = Self::of(ProblemKind::UnknownLocation, detail, request_id);
        problem.suggestions = suggestions.to_vec();
        problem
    }

    pub fn route_not_found(start: &str, end: &str, request_id: impl Into<String>) -> Self {
        Self::of(
            ProblemKind::RouteNotFound,
            format!("No route exists from '{start}' to '{end}'"),
            request_id,
        )
    }

    pub fn search_timeout(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::of(ProblemKind::SearchTimeout, detail, request_id)
    }

    pub fn forbidden(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::of(ProblemKind::Forbidden, detail, request_id)
    }

    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::of(ProblemKind::Internal, detail, request_id)
    }

    pub fn service_unavailable(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::of(ProblemKind::Unavailable, detail, request_id)
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.title, detail),
            None => f.write_str(&self.title),
        }
    }
}

impl std::error::Error for ProblemDetails {}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)],
            Json(self),
        )
            .into_response()
    }
}

/// Convert library errors to ProblemDetails.
///
/// The `request_id` must be provided separately since library errors don't have it.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    match error {
        LibError::InvalidInput { message } => ProblemDetails::bad_request(message, request_id),
        LibError::UnknownStartLocation { label, suggestions } => {
            ProblemDetails::unknown_location("Start", label, suggestions, request_id)
        }
        LibError::UnknownEndLocation { label, suggestions } => {
            ProblemDetails::unknown_location("End", label, suggestions, request_id)
        }
        LibError::NoRouteFound { start, end } => {
            ProblemDetails::route_not_found(start, end, request_id)
        }
        LibError::SearchTimeout { .. } => {
            ProblemDetails::search_timeout(error.to_string(), request_id)
        }
        LibError::StoreUnavailable { path } => ProblemDetails::service_unavailable(
            format!("Building database not available at {}", path.display()),
            request_id,
        ),
        LibError::UnsupportedSchema => {
            ProblemDetails::internal_error("Unsupported building schema", request_id)
        }
        _ => ProblemDetails::internal_error(error.to_string(), request_id),
    }
}

/// Short label for an error, used as a metrics dimension.
pub fn error_reason(error: &LibError) -> &'static str {
    match error {
        LibError::InvalidInput { .. } => "invalid_input",
        LibError::UnknownStartLocation { .. } | LibError::UnknownEndLocation { .. } => {
            "unknown_location"
        }
        LibError::NoRouteFound { .. } => "no_route",
        LibError::SearchTimeout { .. } => "timeout",
        LibError::StoreUnavailable { .. } => "store_unavailable",
        _ => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_problem_details_new() {
        let problem = ProblemDetails::new(
            PROBLEM_UNKNOWN_LOCATION,
            "Unknown Location",
            StatusCode::NOT_FOUND,
        );
        assert_eq!(problem.type_uri, PROBLEM_UNKNOWN_LOCATION);
        assert_eq!(problem.status, 404);
        assert_eq!(problem.content_type, "application/problem+json");
        assert!(problem.suggestions.is_empty());
    }

    #[test]
    fn test_problem_details_bad_request() {
        let problem = ProblemDetails::bad_request("Invalid JSON", "req-123");
        assert_eq!(problem.status, 400);
        assert_eq!(problem.instance.as_deref(), Some("req-123"));
    }

    #[test]
    fn test_problem_details_forbidden() {
        let problem = ProblemDetails::forbidden("not from a browser", "req-9");
        assert_eq!(problem.type_uri, PROBLEM_FORBIDDEN);
        assert_eq!(problem.status, 403);
        assert_eq!(problem.instance.as_deref(), Some("req-9"));
    }

    #[test]
    fn test_unknown_location_with_suggestions() {
        let suggestions = vec!["Restroom".to_string()];
        let problem = ProblemDetails::unknown_location("End", "Restrom", &suggestions, "req-456");

        assert_eq!(problem.status, 404);
        let detail = problem.detail.as_deref().unwrap();
        assert!(detail.starts_with("End location 'Restrom'"));
        assert!(detail.contains("Did you mean: Restroom?"));
        assert_eq!(problem.suggestions, suggestions);
    }

    #[test]
    fn test_unknown_location_without_suggestions() {
        let problem = ProblemDetails::unknown_location("Start", "XYZ", &[], "req-789");
        let detail = problem.detail.as_deref().unwrap();
        assert!(detail.contains("XYZ"));
        assert!(!detail.contains("Did you mean"));

        let json = serde_json::to_string(&problem).unwrap();
        assert!(!json.contains("suggestions"));
    }

    #[test]
    fn test_problem_details_serialization() {
        let problem = ProblemDetails::bad_request("Test error", "req-test");
        let json = serde_json::to_string(&problem).unwrap();

        assert!(json.contains("\"type\":\"/problems/invalid-request\""));
        assert!(json.contains("\"title\":\"Invalid Request\""));
        assert!(json.contains("\"status\":400"));
        assert!(json.contains("\"detail\":\"Test error\""));
        assert!(json.contains("\"instance\":\"req-test\""));
    }

    #[test]
    fn test_from_lib_error_status_mapping() {
        let cases = [
            (
                LibError::InvalidInput {
                    message: "start location is required".into(),
                },
                400,
                PROBLEM_INVALID_REQUEST,
            ),
            (
                LibError::UnknownStartLocation {
                    label: "Nowhere".into(),
                    suggestions: Vec::new(),
                },
                404,
                PROBLEM_UNKNOWN_LOCATION,
            ),
            (
                LibError::NoRouteFound {
                    start: "A".into(),
                    end: "B".into(),
                },
                404,
                PROBLEM_ROUTE_NOT_FOUND,
            ),
            (
                LibError::SearchTimeout {
                    elapsed: Duration::from_millis(2500),
                },
                503,
                PROBLEM_SEARCH_TIMEOUT,
            ),
            (LibError::UnsupportedSchema, 500, PROBLEM_INTERNAL_ERROR),
        ];

        for (error, status, type_uri) in cases {
            let problem = from_lib_error(&error, "req-map");
            assert_eq!(problem.status, status, "{error}");
            assert_eq!(problem.type_uri, type_uri, "{error}");
        }
    }

    #[test]
    fn test_into_response_sets_problem_content_type() {
        let response = ProblemDetails::route_not_found("Cafe", "Storage", "req-1").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/problem+json"
        );
    }

    #[test]
    fn test_display_without_detail_is_title() {
        let problem = ProblemDetails::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        );
        assert_eq!(problem.to_string(), "Internal Error");
        assert_eq!(ProblemKind::SearchTimeout.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_error_reason_labels() {
        let error = LibError::NoRouteFound {
            start: "A".into(),
            end: "B".into(),
        };
        assert_eq!(error_reason(&error), "no_route");
        assert_eq!(error_reason(&LibError::UnsupportedSchema), "internal");
    }
}
