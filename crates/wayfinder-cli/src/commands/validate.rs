//! `validate` subcommand: load a building database and report what it holds.
//!
//! Loading already enforces the schema and cost rules. On top of that the
//! report flags locations whose node no edge touches, since no route can
//! ever start or end there.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Result};
use serde::Serialize;

use wayfinder_lib::{Building, NodeId};

use crate::data::open_building;
use crate::output::{write_report, OutputFormat};

/// Summary of a loaded building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildingReport {
    pub path: String,
    pub coordinate_system: String,
    pub nodes: usize,
    pub edges: usize,
    pub one_way_edges: usize,
    pub locations: usize,
    pub labels: usize,
    pub floors: Vec<i32>,
    pub isolated_locations: Vec<IsolatedLocation>,
}

/// A location no edge can reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IsolatedLocation {
    pub label: String,
    pub node_id: NodeId,
    pub floor: i32,
}

impl BuildingReport {
    pub fn from_building(path: &Path, building: &Building) -> Self {
        let edges = building.edges();
        let connected: HashSet<NodeId> = edges
            .iter()
            .flat_map(|edge| [edge.source, edge.target])
            .collect();

        let isolated_locations = building
            .locations()
            .iter()
            .filter(|location| !connected.contains(&location.node_id))
            .map(|location| IsolatedLocation {
                label: location.label.clone(),
                node_id: location.node_id,
                floor: location.floor,
            })
            .collect();

        let labels: HashSet<&str> = building
            .locations()
            .iter()
            .map(|location| location.label.as_str())
            .collect();

        Self {
            path: path.display().to_string(),
            coordinate_system: building.coordinate_system().to_string(),
            nodes: building.node_count(),
            edges: edges.len(),
            one_way_edges: edges.iter().filter(|e| e.reverse_cost.is_none()).count(),
            locations: building.locations().len(),
            labels: labels.len(),
            floors: building.floors(),
            isolated_locations,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.isolated_locations.is_empty()
    }

    pub fn render(&self) -> String {
        let floors: Vec<String> = self.floors.iter().map(i32::to_string).collect();
        let mut buffer = String::new();
        let _ = writeln!(buffer, "Building: {}", self.path);
        let _ = writeln!(buffer, "  coordinate system: {}", self.coordinate_system);
        let _ = writeln!(
            buffer,
            "  nodes: {}, edges: {} ({} one-way)",
            self.nodes, self.edges, self.one_way_edges
        );
        let _ = writeln!(
            buffer,
            "  locations: {} ({} distinct labels)",
            self.locations, self.labels
        );
        let _ = writeln!(buffer, "  floors: {}", floors.join(", "));
        for location in &self.isolated_locations {
            let _ = writeln!(
                buffer,
                "warning: location '{}' (node {}, floor {}) is not connected to any edge",
                location.label, location.node_id, location.floor
            );
        }
        if self.is_clean() {
            let _ = writeln!(buffer, "OK");
        }
        buffer
    }
}

/// Handle the validate subcommand.
///
/// With `strict`, isolated locations turn into a failing exit status.
pub fn handle_validate_command(
    data_path: Option<&Path>,
    format: OutputFormat,
    strict: bool,
) -> Result<()> {
    let (path, building) = open_building(data_path)?;
    let report = BuildingReport::from_building(&path, &building);

    let stdout = std::io::stdout();
    write_report(&mut stdout.lock(), &report, format)?;

    if strict && !report.is_clean() {
        bail!(
            "{} isolated location(s) found",
            report.isolated_locations.len()
        );
    }
    Ok(())
}
