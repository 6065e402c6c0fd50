//! Route computation over a loaded [`Building`].
//!
//! A request flows through four stages:
//! - [`resolve_candidates`] maps each label (and optional tie-break point) to
//!   candidate nodes,
//! - [`shortest_paths`](crate::path::shortest_paths) runs the batched search
//!   under the request's [`CostPolicy`],
//! - [`select_best`] picks the cheapest reachable pair,
//! - [`assemble`] turns that pair's path into a [`RouteResult`].
//!
//! # Example
//!
//! ```ignore
//! use wayfinder_lib::{compute_route, load_building, RouteRequest};
//!
//! let building = load_building("path/to/building.db".as_ref())?;
//! let request = RouteRequest::new("Main Entrance", "Restroom").avoid_stairs(true);
//! let route = compute_route(&building, &request)?;
//! println!("{} segments, cost {}", route.segment_count(), route.total_cost);
//! ```

mod assemble;
mod resolver;
mod select;

pub use assemble::{assemble, RouteResult, RouteSegment};
pub use resolver::resolve_candidates;
pub use select::select_best;

use tracing::info;

use crate::cost::CostPolicy;
use crate::db::Building;
use crate::error::{Error, Result};
use crate::geo::GeoPoint;
use crate::path::{shortest_paths, SearchBudget};

/// Number of "did you mean" suggestions attached to unknown-location errors.
const SUGGESTION_LIMIT: usize = 3;

/// High-level route computation request.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub start: String,
    pub end: String,
    /// Restricts the start to the single instance nearest this point.
    pub start_tie_break: Option<GeoPoint>,
    /// Restricts the end to the single instance nearest this point.
    pub end_tie_break: Option<GeoPoint>,
    pub avoid_stairs: bool,
    pub budget: SearchBudget,
}

impl RouteRequest {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            start_tie_break: None,
            end_tie_break: None,
            avoid_stairs: false,
            budget: SearchBudget::unlimited(),
        }
    }

    pub fn with_start_tie_break(mut self, point: GeoPoint) -> Self {
        self.start_tie_break = Some(point);
        self
    }

    pub fn with_end_tie_break(mut self, point: GeoPoint) -> Self {
        self.end_tie_break = Some(point);
        self
    }

    pub fn avoid_stairs(mut self, avoid: bool) -> Self {
        self.avoid_stairs = avoid;
        self
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn cost_policy(&self) -> CostPolicy {
        CostPolicy::new(self.avoid_stairs)
    }

    fn validate(&self) -> Result<()> {
        if self.start.trim().is_empty() {
            return Err(Error::invalid_input("start location is required"));
        }
        if self.end.trim().is_empty() {
            return Err(Error::invalid_input("end location is required"));
        }
        for (name, point) in [
            ("start", self.start_tie_break),
            ("end", self.end_tie_break),
        ] {
            if let Some(point) = point {
                if !point.is_valid() {
                    return Err(Error::invalid_input(format!(
                        "{name} geometry {point} is not a valid longitude/latitude"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Compute the cheapest route between two labelled locations.
///
/// Unknown labels fail before any search work is done. When several instances
/// of a label exist (and no tie-break point narrows them), every start/end
/// combination is searched and the cheapest reachable one is reported.
pub fn compute_route(building: &Building, request: &RouteRequest) -> Result<RouteResult> {
    request.validate()?;
    let start = request.start.trim();
    let end = request.end.trim();

    let starts = resolve_candidates(building, start, request.start_tie_break);
    if starts.is_empty() {
        return Err(Error::UnknownStartLocation {
            label: start.to_string(),
            suggestions: building.fuzzy_label_matches(start, SUGGESTION_LIMIT),
        });
    }

    let ends = resolve_candidates(building, end, request.end_tie_break);
    if ends.is_empty() {
        return Err(Error::UnknownEndLocation {
            label: end.to_string(),
            suggestions: building.fuzzy_label_matches(end, SUGGESTION_LIMIT),
        });
    }

    let policy = request.cost_policy();
    let paths = shortest_paths(building.graph(), &starts, &ends, &policy, &request.budget)?;

    let best = select_best(&paths).ok_or_else(|| Error::NoRouteFound {
        start: start.to_string(),
        end: end.to_string(),
    })?;

    let route = assemble(building, best, start, end)?;

    info!(
        start,
        end,
        avoid_stairs = request.avoid_stairs,
        start_candidates = starts.len(),
        end_candidates = ends.len(),
        reachable_pairs = paths.len(),
        start_node = route.start_node,
        end_node = route.end_node,
        segments = route.segment_count(),
        total_cost = route.total_cost,
        "route computed"
    );

    Ok(route)
}
