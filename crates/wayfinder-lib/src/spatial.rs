//! Per-label KD-tree index for nearest-location queries.
//!
//! A label such as "Restroom" may name many nodes across the building. When a
//! caller supplies a tie-break point, exactly one of those nodes is chosen: the
//! one closest to the point in the planar storage system. Each label gets its
//! own 2D tree so a query only ever visits instances of that label.
//!
//! Exact distance ties resolve to the location that appears first in store
//! order, so repeated queries are deterministic.

use std::collections::{HashMap, HashSet};

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use tracing::debug;

use crate::db::{Location, Node, NodeId};
use crate::geo::PlanarPoint;

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

type LabelTree = KdTree<f64, usize, 2, BUCKET_SIZE, u32>;

/// All instances of one label.
///
/// Instances sharing a position (stacked rooms on different floors) collapse
/// into one slot that remembers the earliest location in store order. Slots
/// themselves are in order of first appearance.
struct LabelEntry {
    slots: Vec<(PlanarPoint, usize)>,
    /// `None` when too many slots share a coordinate on one axis for the
    /// tree to split its buckets; such labels are scanned linearly.
    tree: Option<LabelTree>,
}

impl LabelEntry {
    fn new(slots: Vec<(PlanarPoint, usize)>) -> Self {
        let tree = (max_axis_multiplicity(&slots) < BUCKET_SIZE).then(|| {
            let mut tree = LabelTree::new();
            for (slot, (position, _)) in slots.iter().enumerate() {
                tree.add(&position.as_array(), slot);
            }
            tree
        });
        Self { slots, tree }
    }

    fn nearest(&self, point: PlanarPoint) -> Option<usize> {
        match &self.tree {
            Some(tree) => self.nearest_in_tree(tree, point),
            None => self.nearest_by_scan(point),
        }
    }

    fn nearest_in_tree(&self, tree: &LabelTree, point: PlanarPoint) -> Option<usize> {
        let query = point.as_array();
        let best = tree.nearest_n::<SquaredEuclidean>(&query, 1).into_iter().next()?;

        // Widen the radius a hair so every slot at exactly the best distance
        // is returned, then keep the earliest in store order.
        let radius = best.distance + best.distance.abs() * 1e-12 + f64::EPSILON;
        tree.within::<SquaredEuclidean>(&query, radius)
            .into_iter()
            .filter(|candidate| candidate.distance <= best.distance)
            .map(|candidate| self.slots[candidate.item].1)
            .min()
            .or(Some(self.slots[best.item].1))
    }

    fn nearest_by_scan(&self, point: PlanarPoint) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for (position, index) in &self.slots {
            let dx = position.x - point.x;
            let dy = position.y - point.y;
            let distance = dx * dx + dy * dy;
            // Strict: slots are in store order, so the first at a distance wins.
            match best {
                Some((best_distance, _)) if distance >= best_distance => {}
                _ => best = Some((distance, *index)),
            }
        }
        best.map(|(_, index)| index)
    }
}

/// Largest number of slots sharing one coordinate value on either axis.
fn max_axis_multiplicity(slots: &[(PlanarPoint, usize)]) -> usize {
    let mut xs: HashMap<u64, usize> = HashMap::new();
    let mut ys: HashMap<u64, usize> = HashMap::new();
    for (position, _) in slots {
        *xs.entry(coordinate_key(position.x)).or_default() += 1;
        *ys.entry(coordinate_key(position.y)).or_default() += 1;
    }
    xs.values().chain(ys.values()).copied().max().unwrap_or(0)
}

/// Bit pattern of a coordinate with `-0.0` folded into `0.0`.
fn coordinate_key(value: f64) -> u64 {
    (value + 0.0).to_bits()
}

/// Nearest-neighbour index over named locations.
pub struct LocationIndex {
    labels: HashMap<String, LabelEntry>,
}

impl LocationIndex {
    /// Index every label. Locations whose node is unknown are skipped.
    pub fn build(locations: &[Location], nodes: &HashMap<NodeId, Node>) -> Self {
        let mut grouped: HashMap<&str, Vec<(PlanarPoint, usize)>> = HashMap::new();
        let mut seen: HashSet<(&str, u64, u64)> = HashSet::new();
        let mut indexed = 0usize;

        for (index, location) in locations.iter().enumerate() {
            let Some(node) = nodes.get(&location.node_id) else {
                continue;
            };
            indexed += 1;
            let position = node.position;
            let key = (
                location.label.as_str(),
                coordinate_key(position.x),
                coordinate_key(position.y),
            );
            if !seen.insert(key) {
                continue;
            }
            grouped
                .entry(location.label.as_str())
                .or_default()
                .push((position, index));
        }

        let labels: HashMap<String, LabelEntry> = grouped
            .into_iter()
            .map(|(label, slots)| (label.to_string(), LabelEntry::new(slots)))
            .collect();
        let scanned = labels.values().filter(|entry| entry.tree.is_none()).count();

        debug!(labels = labels.len(), indexed, scanned, "built location index");

        Self { labels }
    }

    /// Number of distinct indexed labels.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Index of the location with `label` nearest to `point`.
    pub fn nearest(&self, label: &str, point: PlanarPoint) -> Option<usize> {
        self.labels.get(label)?.nearest(point)
    }
}

impl std::fmt::Debug for LocationIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationIndex")
            .field("labels", &self.labels.len())
            .finish()
    }
}
