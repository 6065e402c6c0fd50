use tracing::debug;

use crate::db::{Building, NodeId};
use crate::geo::GeoPoint;

/// Resolve a location label to its candidate nodes.
///
/// Without a tie-break point every node carrying `label` is returned, in store
/// order. With one, only the instance nearest to the point (planar distance in
/// the storage system) is returned. An empty result means the label is unknown.
pub fn resolve_candidates(
    building: &Building,
    label: &str,
    tie_break: Option<GeoPoint>,
) -> Vec<NodeId> {
    let candidates = match tie_break {
        None => building.find_nodes_by_label(label),
        Some(point) => {
            let planar = building.coordinate_system().project(point);
            building
                .find_nearest_node_by_label(label, planar)
                .into_iter()
                .collect()
        }
    };

    debug!(
        label,
        tie_break = tie_break.is_some(),
        candidates = candidates.len(),
        "resolved location candidates"
    );

    candidates
}
