use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use rusqlite::{Connection, OpenFlags, Row};
use tracing::{debug, warn};

use crate::cost::{is_stair_like, STAIRS_PENALTY};
use crate::error::{Error, Result};
use crate::geo::{CoordinateSystem, PlanarPoint};
use crate::graph::{Edge, EdgeKind, Graph};
use crate::spatial::LocationIndex;

/// Numeric identifier for a circulation node.
pub type NodeId = i64;

/// Minimum Jaro-Winkler similarity for a label to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Category assigned to locations whose store row carries none.
pub const DEFAULT_CATEGORY: &str = "uncategorized";

/// Vertex of the circulation graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub floor: i32,
    /// Position in storage coordinates.
    pub position: PlanarPoint,
}

/// Named destination bound to a graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub node_id: NodeId,
    pub label: String,
    pub category: String,
    pub floor: i32,
}

/// Immutable in-memory snapshot of a building's circulation graph.
///
/// Construction validates the data once; afterwards every query is read-only,
/// so a snapshot can be shared across threads behind an `Arc`.
pub struct Building {
    nodes: HashMap<NodeId, Node>,
    /// Locations in store order.
    locations: Vec<Location>,
    /// Label to indices into `locations`, in store order.
    label_index: HashMap<String, Vec<usize>>,
    graph: Graph,
    location_index: LocationIndex,
    coordinate_system: CoordinateSystem,
}

impl Building {
    /// Assemble a snapshot from raw records.
    ///
    /// Fails with [`Error::InvalidGraphData`] for negative or non-finite costs
    /// and duplicate edge ids. Edges and locations that reference unknown nodes
    /// are dropped with a warning. Edges without geometry get a straight line
    /// between their endpoints.
    pub fn from_parts(
        nodes: Vec<Node>,
        locations: Vec<Location>,
        edges: Vec<Edge>,
        coordinate_system: CoordinateSystem,
    ) -> Result<Self> {
        let mut node_map = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if !node.position.x.is_finite() || !node.position.y.is_finite() {
                return Err(Error::invalid_graph(format!(
                    "node {} has a non-finite position",
                    node.id
                )));
            }
            if node_map.insert(node.id, node).is_some() {
                return Err(Error::invalid_graph("duplicate node id"));
            }
        }

        let mut seen_edges = HashSet::with_capacity(edges.len());
        let mut kept_edges = Vec::with_capacity(edges.len());
        let mut skipped_edges = 0usize;
        for mut edge in edges {
            let stair_like = is_stair_like(&edge.kind, edge.label.as_deref());
            validate_cost(edge.id, "cost", edge.cost, stair_like)?;
            if let Some(reverse) = edge.reverse_cost {
                validate_cost(edge.id, "reverse_cost", reverse, stair_like)?;
            }
            if !seen_edges.insert(edge.id) {
                return Err(Error::invalid_graph(format!("duplicate edge id {}", edge.id)));
            }
            let (Some(source), Some(target)) =
                (node_map.get(&edge.source), node_map.get(&edge.target))
            else {
                skipped_edges += 1;
                continue;
            };
            if edge.geometry.is_empty() {
                edge.geometry = vec![source.position, target.position];
            }
            kept_edges.push(edge);
        }
        if skipped_edges > 0 {
            warn!(skipped_edges, "ignored edges referencing unknown nodes");
        }

        let before = locations.len();
        let locations: Vec<Location> = locations
            .into_iter()
            .filter(|location| node_map.contains_key(&location.node_id))
            .collect();
        let skipped_locations = before - locations.len();
        if skipped_locations > 0 {
            warn!(skipped_locations, "ignored locations referencing unknown nodes");
        }

        let mut label_index: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, location) in locations.iter().enumerate() {
            label_index
                .entry(location.label.clone())
                .or_default()
                .push(index);
        }

        let location_index = LocationIndex::build(&locations, &node_map);
        let graph = Graph::build(kept_edges);

        Ok(Self {
            nodes: node_map,
            locations,
            label_index,
            graph,
            location_index,
            coordinate_system,
        })
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Distinct floors that hold at least one node, ascending.
    pub fn floors(&self) -> Vec<i32> {
        let floors: BTreeSet<i32> = self.nodes.values().map(|node| node.floor).collect();
        floors.into_iter().collect()
    }

    /// All locations in store order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// All edges, ordered by id.
    pub fn edges(&self) -> &[Edge] {
        self.graph.edges()
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn coordinate_system(&self) -> CoordinateSystem {
        self.coordinate_system
    }

    /// Node ids of every location carrying `label`, in store order, without duplicates.
    pub fn find_nodes_by_label(&self, label: &str) -> Vec<NodeId> {
        let Some(indices) = self.label_index.get(label) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        indices
            .iter()
            .map(|&index| self.locations[index].node_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Node of the `label` location closest to `point` (planar distance).
    pub fn find_nearest_node_by_label(&self, label: &str, point: PlanarPoint) -> Option<NodeId> {
        self.location_index
            .nearest(label, point)
            .map(|index| self.locations[index].node_id)
    }

    /// Known labels similar to `label`, best match first.
    pub fn fuzzy_label_matches(&self, label: &str, limit: usize) -> Vec<String> {
        let needle = label.to_lowercase();
        let mut scored: Vec<(f64, &String)> = self
            .label_index
            .keys()
            .map(|known| (strsim::jaro_winkler(&needle, &known.to_lowercase()), known))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, known)| known.clone())
            .collect()
    }
}

impl std::fmt::Debug for Building {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Building")
            .field("nodes", &self.nodes.len())
            .field("locations", &self.locations.len())
            .field("edges", &self.graph.edges().len())
            .field("coordinate_system", &self.coordinate_system)
            .finish()
    }
}

/// Costs must be finite and non-negative. Stair costs must also stay finite
/// once penalized, or an avoid-stairs search could not fall back to them.
fn validate_cost(edge: i64, field: &str, value: f64, stair_like: bool) -> Result<()> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(Error::invalid_graph(format!(
            "edge {edge} has invalid {field} {value}; costs must be finite and non-negative"
        )));
    }
    if stair_like && !(value * STAIRS_PENALTY).is_finite() {
        return Err(Error::invalid_graph(format!(
            "edge {edge} has {field} {value}, too large to penalize as stairs"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SchemaDefinition {
    has_category: bool,
    has_location_floor: bool,
    has_edge_label: bool,
    has_metadata: bool,
}

const NODE_COLUMNS: &[&str] = &["id", "floor", "x", "y"];
const LOCATION_COLUMNS: &[&str] = &["node_id", "label"];
const EDGE_COLUMNS: &[&str] = &[
    "id",
    "source",
    "target",
    "cost",
    "reverse_cost",
    "floor",
    "kind",
    "geometry",
];

/// Load a building snapshot from a SQLite database.
///
/// The loader checks for the `nodes`, `locations` and `edges` tables and their
/// required columns before reading. Optional columns (`locations.category`,
/// `locations.floor`, `edges.label`) and the optional `metadata` table are
/// detected at runtime. Locations keep their row order, which is the order the
/// candidate resolver reports them in.
pub fn load_building(db_path: &Path) -> Result<Building> {
    if !db_path.exists() {
        return Err(Error::StoreUnavailable {
            path: db_path.to_path_buf(),
        });
    }

    let connection = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let schema = detect_schema(&connection)?;
    let coordinate_system = load_coordinate_system(&connection, &schema)?;
    debug!(
        path = %db_path.display(),
        coordinate_system = %coordinate_system,
        "loading building"
    );

    let nodes = load_nodes(&connection)?;
    let floors: HashMap<NodeId, i32> = nodes.iter().map(|node| (node.id, node.floor)).collect();
    let locations = load_locations(&connection, &schema, &floors)?;
    let edges = load_edges(&connection, &schema)?;

    debug!(
        nodes = nodes.len(),
        locations = locations.len(),
        edges = edges.len(),
        "read building records"
    );

    Building::from_parts(nodes, locations, edges, coordinate_system)
}

fn detect_schema(connection: &Connection) -> Result<SchemaDefinition> {
    for (table, columns) in [
        ("nodes", NODE_COLUMNS),
        ("locations", LOCATION_COLUMNS),
        ("edges", EDGE_COLUMNS),
    ] {
        if !table_exists(connection, table)? || !table_has_columns(connection, table, columns)? {
            return Err(Error::UnsupportedSchema);
        }
    }

    let has_metadata = table_exists(connection, "metadata")?
        && table_has_columns(connection, "metadata", &["key", "value"])?;

    Ok(SchemaDefinition {
        has_category: table_has_columns(connection, "locations", &["category"])?,
        has_location_floor: table_has_columns(connection, "locations", &["floor"])?,
        has_edge_label: table_has_columns(connection, "edges", &["label"])?,
        has_metadata,
    })
}

fn load_coordinate_system(
    connection: &Connection,
    schema: &SchemaDefinition,
) -> Result<CoordinateSystem> {
    if !schema.has_metadata {
        return Ok(CoordinateSystem::default());
    }

    let mut stmt = connection.prepare("SELECT value FROM metadata WHERE key = 'srid' LIMIT 1")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => {
            let value: String = row.get(0)?;
            value.parse()
        }
        None => Ok(CoordinateSystem::default()),
    }
}

fn load_nodes(connection: &Connection) -> Result<Vec<Node>> {
    let mut stmt = connection.prepare("SELECT id, floor, x, y FROM nodes ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(Node {
            id: row.get(0)?,
            floor: row.get(1)?,
            position: PlanarPoint::new(row.get(2)?, row.get(3)?),
        })
    })?;

    let mut nodes = Vec::new();
    for entry in rows {
        nodes.push(entry?);
    }
    Ok(nodes)
}

fn load_locations(
    connection: &Connection,
    schema: &SchemaDefinition,
    floors: &HashMap<NodeId, i32>,
) -> Result<Vec<Location>> {
    let category = if schema.has_category {
        "category"
    } else {
        "NULL AS category"
    };
    let floor = if schema.has_location_floor {
        "floor"
    } else {
        "NULL AS floor"
    };
    let sql = format!("SELECT node_id, label, {category}, {floor} FROM locations ORDER BY rowid");

    let mut stmt = connection.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, NodeId>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<i32>>(3)?,
        ))
    })?;

    let mut locations = Vec::new();
    for entry in rows {
        let (node_id, label, category, floor) = entry?;
        // Unknown nodes keep floor 0 here; `Building::from_parts` drops them anyway.
        let floor = floor.or_else(|| floors.get(&node_id).copied()).unwrap_or(0);
        locations.push(Location {
            node_id,
            label,
            category: category
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            floor,
        });
    }
    Ok(locations)
}

fn load_edges(connection: &Connection, schema: &SchemaDefinition) -> Result<Vec<Edge>> {
    let label = if schema.has_edge_label {
        "label"
    } else {
        "NULL AS label"
    };
    let sql = format!(
        "SELECT id, source, target, cost, reverse_cost, floor, kind, {label}, geometry \
         FROM edges ORDER BY id"
    );

    let mut stmt = connection.prepare(&sql)?;
    let mut rows = stmt.query([])?;

    let mut edges = Vec::new();
    while let Some(row) = rows.next()? {
        edges.push(row_to_edge(row)?);
    }
    Ok(edges)
}

fn row_to_edge(row: &Row<'_>) -> Result<Edge> {
    let id: i64 = row.get(0)?;
    let kind: String = row.get(6)?;
    let geometry: Option<String> = row.get(8)?;

    Ok(Edge {
        id,
        source: row.get(1)?,
        target: row.get(2)?,
        cost: row.get(3)?,
        reverse_cost: row.get(4)?,
        floor: row.get(5)?,
        kind: kind.parse().unwrap_or(EdgeKind::Corridor),
        label: row.get(7)?,
        geometry: parse_geometry(id, geometry.as_deref())?,
    })
}

/// Parse a JSON `[[x, y], ...]` polyline.
fn parse_geometry(edge: i64, raw: Option<&str>) -> Result<Vec<PlanarPoint>> {
    let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
        return Ok(Vec::new());
    };
    let coordinates: Vec<[f64; 2]> = serde_json::from_str(raw).map_err(|err| {
        Error::invalid_graph(format!("edge {edge} has malformed geometry: {err}"))
    })?;
    if coordinates.len() == 1 {
        return Err(Error::invalid_graph(format!(
            "edge {edge} geometry needs at least two points"
        )));
    }
    Ok(coordinates
        .into_iter()
        .map(|[x, y]| PlanarPoint::new(x, y))
        .collect())
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let mut stmt = connection
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}

fn table_has_columns(connection: &Connection, table: &str, required: &[&str]) -> Result<bool> {
    let pragma = format!("PRAGMA table_info('{table}')");
    let mut stmt = connection.prepare(&pragma)?;
    let mut rows = stmt.query([])?;

    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        columns.push(name);
    }

    Ok(required.iter().all(|required| {
        columns
            .iter()
            .any(|column| column.eq_ignore_ascii_case(required))
    }))
}
