use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Serialize, Serializer};

use crate::db::NodeId;
use crate::geo::PlanarPoint;

/// Identifier of an edge record in the graph store.
pub type EdgeId = i64;

/// Classification of a circulation edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Corridor,
    Stairs,
    Elevator,
    Ramp,
    /// Generic vertical connector between floors; its label tells what it is.
    Vertical,
    Other(String),
}

impl EdgeKind {
    pub fn as_str(&self) -> &str {
        match self {
            EdgeKind::Corridor => "corridor",
            EdgeKind::Stairs => "stairs",
            EdgeKind::Elevator => "elevator",
            EdgeKind::Ramp => "ramp",
            EdgeKind::Vertical => "vertical",
            EdgeKind::Other(raw) => raw.as_str(),
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for EdgeKind {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let kind = match value.trim().to_ascii_lowercase().as_str() {
            "corridor" | "hallway" => EdgeKind::Corridor,
            "stairs" | "staircase" => EdgeKind::Stairs,
            "elevator" | "lift" => EdgeKind::Elevator,
            "ramp" => EdgeKind::Ramp,
            "vertical" | "connector" => EdgeKind::Vertical,
            _ => EdgeKind::Other(value.trim().to_string()),
        };
        Ok(kind)
    }
}

impl Serialize for EdgeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Direction in which an edge is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// From `source` to `target`, priced with `cost`.
    Forward,
    /// From `target` to `source`, priced with `reverse_cost`.
    Reverse,
}

/// Directed circulation edge with independent cost per direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub cost: f64,
    /// `None` marks a one-way edge that cannot be walked target to source.
    pub reverse_cost: Option<f64>,
    pub floor: i32,
    pub kind: EdgeKind,
    pub label: Option<String>,
    /// Polyline from `source` to `target` in storage coordinates.
    pub geometry: Vec<PlanarPoint>,
}

impl Edge {
    /// Base cost of walking the edge in `direction`, if that direction is open.
    pub fn base_cost(&self, direction: Direction) -> Option<f64> {
        match direction {
            Direction::Forward => Some(self.cost),
            Direction::Reverse => self.reverse_cost,
        }
    }

    /// Node reached after walking the edge in `direction`.
    pub fn head(&self, direction: Direction) -> NodeId {
        match direction {
            Direction::Forward => self.target,
            Direction::Reverse => self.source,
        }
    }

    /// Node the walk starts from in `direction`.
    pub fn tail(&self, direction: Direction) -> NodeId {
        match direction {
            Direction::Forward => self.source,
            Direction::Reverse => self.target,
        }
    }
}

/// One way of leaving a node: an edge walked in a given direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Traversal {
    /// Index into [`Graph::edges`].
    pub edge: usize,
    pub target: NodeId,
    pub direction: Direction,
}

/// Directed graph used by the path search.
///
/// Edges are kept in id order and each node's outgoing traversals follow that
/// order (forward before reverse for the same edge), so iteration order is
/// stable across loads of the same data.
#[derive(Debug, Clone)]
pub struct Graph {
    edges: Arc<Vec<Edge>>,
    adjacency: Arc<HashMap<NodeId, Vec<Traversal>>>,
}

impl Graph {
    /// Build a graph from edges that have already been validated.
    pub fn build(mut edges: Vec<Edge>) -> Self {
        edges.sort_by_key(|edge| edge.id);

        let mut adjacency: HashMap<NodeId, Vec<Traversal>> = HashMap::new();
        for (index, edge) in edges.iter().enumerate() {
            adjacency.entry(edge.source).or_default().push(Traversal {
                edge: index,
                target: edge.target,
                direction: Direction::Forward,
            });
            if edge.reverse_cost.is_some() {
                adjacency.entry(edge.target).or_default().push(Traversal {
                    edge: index,
                    target: edge.source,
                    direction: Direction::Reverse,
                });
            }
        }

        Self {
            edges: Arc::new(edges),
            adjacency: Arc::new(adjacency),
        }
    }

    /// All edges, ordered by id.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge(&self, index: usize) -> &Edge {
        &self.edges[index]
    }

    /// Outgoing traversals for a node.
    pub fn traversals(&self, node: NodeId) -> &[Traversal] {
        self.adjacency
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            edges: Arc::new(Vec::new()),
            adjacency: Arc::new(HashMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(id: EdgeId, source: NodeId, target: NodeId, reverse: Option<f64>) -> Edge {
        Edge {
            id,
            source,
            target,
            cost: 1.0,
            reverse_cost: reverse,
            floor: 0,
            kind: EdgeKind::Corridor,
            label: None,
            geometry: Vec::new(),
        }
    }

    #[test]
    fn one_way_edges_only_leave_their_source() {
        let graph = Graph::build(vec![edge(1, 10, 20, None)]);

        assert_eq!(graph.traversals(10).len(), 1);
        assert_eq!(graph.traversals(10)[0].target, 20);
        assert!(graph.traversals(20).is_empty());
    }

    #[test]
    fn traversals_follow_edge_id_order() {
        let graph = Graph::build(vec![
            edge(7, 1, 3, Some(1.0)),
            edge(2, 1, 2, Some(1.0)),
            edge(5, 4, 1, Some(1.0)),
        ]);

        let order: Vec<_> = graph
            .traversals(1)
            .iter()
            .map(|t| (graph.edge(t.edge).id, t.direction))
            .collect();
        assert_eq!(
            order,
            vec![
                (2, Direction::Forward),
                (5, Direction::Reverse),
                (7, Direction::Forward)
            ]
        );
    }

    #[test]
    fn edge_kind_parses_known_and_unknown_values() {
        assert_eq!("Stairs".parse::<EdgeKind>().unwrap(), EdgeKind::Stairs);
        assert_eq!("LIFT".parse::<EdgeKind>().unwrap(), EdgeKind::Elevator);
        assert_eq!(
            "escalator".parse::<EdgeKind>().unwrap(),
            EdgeKind::Other("escalator".to_string())
        );
        assert_eq!(EdgeKind::Other("escalator".into()).to_string(), "escalator");
    }

    #[test]
    fn edge_reports_direction_specific_costs() {
        let e = edge(1, 1, 2, Some(4.0));
        assert_eq!(e.base_cost(Direction::Forward), Some(1.0));
        assert_eq!(e.base_cost(Direction::Reverse), Some(4.0));
        assert_eq!(e.head(Direction::Reverse), 1);
        assert_eq!(e.tail(Direction::Reverse), 2);
    }
}
