//! Wayfinder library entry points.
//!
//! This crate loads a building's circulation graph from SQLite into an
//! immutable [`Building`] snapshot and computes accessible indoor routes
//! between labelled locations. Higher-level consumers (CLI, HTTP service)
//! should only depend on the functions exported here instead of
//! reimplementing behavior.
//!

#![deny(warnings)]

pub mod catalog;
pub mod cost;
pub mod db;
pub mod error;
pub mod geo;
pub mod graph;
pub mod output;
pub mod path;
pub mod routing;
pub mod spatial;

pub use catalog::{list_locations, LocationCatalog};
pub use cost::{is_stair_like, CostPolicy, STAIRS_PENALTY};
pub use db::{load_building, Building, Location, Node, NodeId};
pub use error::{Error, Result};
pub use geo::{CoordinateSystem, GeoPoint, Geometry, PlanarPoint};
pub use graph::{Direction, Edge, EdgeId, EdgeKind, Graph};
pub use output::{render_catalog, render_route, RouteRenderMode};
pub use path::{shortest_paths, PairPath, PathStep, SearchBudget};
pub use routing::{
    assemble, compute_route, resolve_candidates, select_best, RouteRequest, RouteResult,
    RouteSegment,
};
