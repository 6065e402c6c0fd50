//! Envelope for successful JSON responses.
//!
//! The payload's fields are flattened into the top-level object next to a
//! `content_type` marker and, when known, the request id. Problem responses
//! carry the same id in `instance`, so a kiosk log line can be matched to
//! either outcome.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

const JSON_CONTENT_TYPE: &str = "application/json";

/// Successful response body.
///
/// ```
/// use wayfinder_service_shared::ServiceResponse;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Summary {
///     segments: usize,
///     total_cost: f64,
/// }
///
/// let response = ServiceResponse::new(Summary { segments: 4, total_cost: 60.0 })
///     .with_request_id("kiosk-7");
/// assert_eq!(response.request_id.as_deref(), Some("kiosk-7"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse<T> {
    #[serde(flatten)]
    pub data: T,

    pub content_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl<T> ServiceResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            content_type: JSON_CONTENT_TYPE.to_string(),
            request_id: None,
        }
    }

    /// Attach the id the request was served under.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

impl<T> From<T> for ServiceResponse<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

impl<T: Serialize> IntoResponse for ServiceResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
