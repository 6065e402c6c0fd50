//! Request types and validation for HTTP endpoints.

use serde::{Deserialize, Serialize};
use wayfinder_lib::{GeoPoint, SearchBudget};

use crate::ProblemDetails;

/// Validation trait for request types.
///
/// Implementations should validate all fields and return a `ProblemDetails`
/// error for invalid input.
pub trait Validate {
    /// Validate the request, returning an error if invalid.
    ///
    /// The `request_id` is used to populate the `instance` field of any
    /// returned `ProblemDetails`.
    ///
    /// Returns a boxed `ProblemDetails` to avoid large `Result::Err` variants.
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

/// Request for computing a route between two labelled locations.
///
/// ```json
/// {
///   "start": "Main Entrance",
///   "end": "Restroom",
///   "end_geometry": {
///     "type": "Polygon",
///     "coordinates": [[[21.0145, 52.2246], [21.0146, 52.2246], [21.0146, 52.2247], [21.0145, 52.2246]]]
///   },
///   "avoid_stairs": true
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Start location label.
    #[serde(default)]
    pub start: String,

    /// End location label.
    #[serde(default)]
    pub end: String,

    /// Where the user picked the start; selects among same-labelled instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_geometry: Option<PickGeometry>,

    /// Where the user picked the end; selects among same-labelled instances.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_geometry: Option<PickGeometry>,

    /// Penalize stairs so they are used only as a last resort.
    #[serde(default)]
    pub avoid_stairs: bool,
}

/// A GeoJSON position: longitude, latitude and an ignored optional altitude.
pub type Position = Vec<f64>;

/// Where the user picked a location on the map, in WGS-84 longitude/latitude.
///
/// Map clients send either the clicked point or the room's footprint. A
/// footprint stands for the centre of the bounding box of its outer rings;
/// holes never move it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PickGeometry {
    Point { coordinates: Position },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

impl PickGeometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Self::Point {
            coordinates: vec![lon, lat],
        }
    }

    fn positions(&self) -> Vec<&Position> {
        match self {
            Self::Point { coordinates } => vec![coordinates],
            Self::Polygon { coordinates } => coordinates.iter().take(1).flatten().collect(),
            Self::MultiPolygon { coordinates } => coordinates
                .iter()
                .filter_map(|polygon| polygon.first())
                .flatten()
                .collect(),
        }
    }

    /// The point this geometry stands for, or `None` when it holds no
    /// `[longitude, latitude]` positions.
    pub fn to_geo_point(&self) -> Option<GeoPoint> {
        let mut bounds: Option<[f64; 4]> = None;
        for position in self.positions() {
            let (lon, lat) = lon_lat(position)?;
            bounds = Some(match bounds {
                Some([min_lon, min_lat, max_lon, max_lat]) => [
                    min_lon.min(lon),
                    min_lat.min(lat),
                    max_lon.max(lon),
                    max_lat.max(lat),
                ],
                None => [lon, lat, lon, lat],
            });
        }
        let [min_lon, min_lat, max_lon, max_lat] = bounds?;
        Some(GeoPoint::new(
            (min_lon + max_lon) / 2.0,
            (min_lat + max_lat) / 2.0,
        ))
    }

    fn check(&self, field: &str, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        let positions = self.positions();
        if positions.is_empty() {
            return Err(Box::new(ProblemDetails::bad_request(
                format!("The '{}' field has no coordinates", field),
                request_id,
            )));
        }

        let all_valid = positions.iter().all(|position| {
            lon_lat(position).is_some_and(|(lon, lat)| GeoPoint::new(lon, lat).is_valid())
        });
        if !all_valid {
            return Err(Box::new(ProblemDetails::bad_request(
                format!(
                    "The '{}' field must hold [longitude, latitude] positions in degrees",
                    field
                ),
                request_id,
            )));
        }

        Ok(())
    }
}

fn lon_lat(position: &Position) -> Option<(f64, f64)> {
    match position.as_slice() {
        [lon, lat, ..] => Some((*lon, *lat)),
        _ => None,
    }
}

impl RouteRequest {
    /// Convert into a library request with the given search budget.
    pub fn to_lib_request(&self, budget: SearchBudget) -> wayfinder_lib::RouteRequest {
        let mut request = wayfinder_lib::RouteRequest::new(self.start.trim(), self.end.trim())
            .avoid_stairs(self.avoid_stairs)
            .with_budget(budget);
        if let Some(point) = self.start_geometry.as_ref().and_then(PickGeometry::to_geo_point) {
            request = request.with_start_tie_break(point);
        }
        if let Some(point) = self.end_geometry.as_ref().and_then(PickGeometry::to_geo_point) {
            request = request.with_end_tie_break(point);
        }
        request
    }
}

impl Validate for RouteRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if self.start.trim().is_empty() {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'start' field is required and cannot be empty",
                request_id,
            )));
        }

        if self.end.trim().is_empty() {
            return Err(Box::new(ProblemDetails::bad_request(
                "The 'end' field is required and cannot be empty",
                request_id,
            )));
        }

        if let Some(geometry) = &self.start_geometry {
            geometry.check("start_geometry", request_id)?;
        }

        if let Some(geometry) = &self.end_geometry {
            geometry.check("end_geometry", request_id)?;
        }

        Ok(())
    }
}
