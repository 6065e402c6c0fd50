use serde::Serialize;

use crate::db::{Building, Node, NodeId};
use crate::error::{Error, Result};
use crate::geo::{GeoPoint, Geometry};
use crate::graph::{Direction, EdgeId, EdgeKind};
use crate::path::PairPath;

/// One traversed edge of a route, in geographic coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSegment {
    pub edge_id: EdgeId,
    pub floor: i32,
    pub kind: EdgeKind,
    /// Line string oriented in the direction of travel.
    pub geometry: Geometry,
    /// Effective cost of this segment.
    pub cost: f64,
}

/// Assembled result of a successful route computation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    /// Sum of effective segment costs; the value the route was selected on.
    pub total_cost: f64,
    /// Sum of un-penalized base costs along the same path.
    pub base_cost: f64,
    pub start_point: Geometry,
    pub end_point: Geometry,
    pub start_floor: i32,
    pub end_floor: i32,
    pub start_node: NodeId,
    pub end_node: NodeId,
    pub start_label: String,
    pub end_label: String,
    pub segments: Vec<RouteSegment>,
}

impl RouteResult {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Floors visited along the route, consecutive repeats collapsed.
    pub fn floors(&self) -> Vec<i32> {
        let mut floors = vec![self.start_floor];
        for floor in self
            .segments
            .iter()
            .map(|segment| segment.floor)
            .chain(std::iter::once(self.end_floor))
        {
            if floors.last() != Some(&floor) {
                floors.push(floor);
            }
        }
        floors
    }
}

/// Turn the winning pair's path into a [`RouteResult`].
///
/// Segments follow the path's traversal order one-to-one; nothing is merged,
/// dropped or reordered.
pub fn assemble(
    building: &Building,
    path: &PairPath,
    start_label: &str,
    end_label: &str,
) -> Result<RouteResult> {
    let system = building.coordinate_system();
    let start = endpoint(building, path.start)?;
    let end = endpoint(building, path.end)?;

    let mut base_cost = 0.0;
    let mut segments = Vec::with_capacity(path.steps.len());
    for step in &path.steps {
        let edge = building.graph().edge(step.edge);
        base_cost += edge.base_cost(step.direction).unwrap_or(step.cost);

        let mut points: Vec<GeoPoint> = edge
            .geometry
            .iter()
            .map(|point| system.unproject(*point))
            .collect();
        if step.direction == Direction::Reverse {
            points.reverse();
        }

        segments.push(RouteSegment {
            edge_id: edge.id,
            floor: edge.floor,
            kind: edge.kind.clone(),
            geometry: Geometry::line_string(&points),
            cost: step.cost,
        });
    }

    Ok(RouteResult {
        total_cost: path.total_cost,
        base_cost,
        start_point: Geometry::point(system.unproject(start.position)),
        end_point: Geometry::point(system.unproject(end.position)),
        start_floor: start.floor,
        end_floor: end.floor,
        start_node: start.id,
        end_node: end.id,
        start_label: start_label.to_string(),
        end_label: end_label.to_string(),
        segments,
    })
}

fn endpoint(building: &Building, id: NodeId) -> Result<&Node> {
    building
        .node(id)
        .ok_or_else(|| Error::invalid_graph(format!("route endpoint {id} is not a known node")))
}
