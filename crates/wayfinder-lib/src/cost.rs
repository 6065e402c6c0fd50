//! Accessibility cost policy.
//!
//! The policy only rewrites costs; it never adds or removes traversals, so the
//! same [`Graph`](crate::graph::Graph) serves every preference.

use serde::Serialize;

use crate::graph::{Direction, Edge, EdgeKind};

/// Multiplier applied to stair-like edges when stairs are avoided.
///
/// Large enough that any stair-free path wins, finite so that a stair route is
/// still found when nothing else connects the endpoints.
pub const STAIRS_PENALTY: f64 = 1_000_000.0;

/// Label prefix marking a vertical connector as a stairway.
pub const STAIRS_LABEL_PREFIX: &str = "stairs";

/// Returns `true` for edges treated as stairs for accessibility purposes.
///
/// That is any `Stairs` edge, plus vertical connectors whose label starts with
/// [`STAIRS_LABEL_PREFIX`] (ASCII case-insensitive).
pub fn is_stair_like(kind: &EdgeKind, label: Option<&str>) -> bool {
    match kind {
        EdgeKind::Stairs => true,
        EdgeKind::Vertical => label
            .and_then(|label| label.get(..STAIRS_LABEL_PREFIX.len()))
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(STAIRS_LABEL_PREFIX)),
        _ => false,
    }
}

/// Cost transformation selected by the caller's accessibility preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CostPolicy {
    pub avoid_stairs: bool,
}

impl CostPolicy {
    pub fn new(avoid_stairs: bool) -> Self {
        Self { avoid_stairs }
    }

    /// Effective cost of walking `edge` in `direction`.
    ///
    /// Returns `None` when the edge is closed in that direction. Stair-like
    /// edges are penalized identically in both directions.
    pub fn effective_cost(&self, edge: &Edge, direction: Direction) -> Option<f64> {
        let base = edge.base_cost(direction)?;
        Some(self.adjust(base, &edge.kind, edge.label.as_deref()))
    }

    /// Apply the policy to a base cost for an edge of the given kind and label.
    pub fn adjust(&self, base_cost: f64, kind: &EdgeKind, label: Option<&str>) -> f64 {
        if self.avoid_stairs && is_stair_like(kind, label) {
            base_cost * STAIRS_PENALTY
        } else {
            base_cost
        }
    }
}
