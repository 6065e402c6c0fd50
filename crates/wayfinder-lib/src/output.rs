use std::fmt::Write;

use crate::catalog::LocationCatalog;
use crate::geo::Geometry;
use crate::routing::{RouteResult, RouteSegment};

/// Presentation style for turning a [`RouteResult`] into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteRenderMode {
    /// Header plus one line per segment.
    #[default]
    PlainText,
    /// Header plus one line per floor change.
    Floors,
}

/// Render a route for terminal output.
pub fn render_route(route: &RouteResult, mode: RouteRenderMode) -> String {
    match mode {
        RouteRenderMode::PlainText => render_plain(route),
        RouteRenderMode::Floors => render_floors(route),
    }
}

fn header(buffer: &mut String, route: &RouteResult) {
    let _ = writeln!(
        buffer,
        "Route: {} (floor {}) -> {} (floor {})",
        route.start_label, route.start_floor, route.end_label, route.end_floor
    );
    let _ = write!(
        buffer,
        "{} segments, cost {}",
        route.segment_count(),
        format_cost(route.total_cost)
    );
    if route.base_cost != route.total_cost {
        let _ = write!(buffer, " (base {})", format_cost(route.base_cost));
    }
    let _ = writeln!(buffer);
}

fn render_plain(route: &RouteResult) -> String {
    let mut buffer = String::new();
    header(&mut buffer, route);
    for (index, segment) in route.segments.iter().enumerate() {
        let _ = writeln!(
            buffer,
            "{:>3}: floor {:>2}  {:<10} edge {:<6} cost {}",
            index + 1,
            segment.floor,
            segment.kind,
            segment.edge_id,
            format_cost(segment.cost)
        );
    }
    buffer
}

fn render_floors(route: &RouteResult) -> String {
    let mut buffer = String::new();
    header(&mut buffer, route);

    let mut current: Option<(i32, usize, f64)> = None;
    for segment in &route.segments {
        current = match current {
            Some((floor, count, cost)) if floor == segment.floor => {
                Some((floor, count + 1, cost + segment.cost))
            }
            Some(previous) => {
                write_floor_line(&mut buffer, previous);
                Some(first_on_floor(segment))
            }
            None => Some(first_on_floor(segment)),
        };
    }
    if let Some(last) = current {
        write_floor_line(&mut buffer, last);
    }
    buffer
}

fn first_on_floor(segment: &RouteSegment) -> (i32, usize, f64) {
    (segment.floor, 1, segment.cost)
}

fn write_floor_line(buffer: &mut String, (floor, count, cost): (i32, usize, f64)) {
    let _ = writeln!(
        buffer,
        "floor {floor:>2}: {count} segments, cost {}",
        format_cost(cost)
    );
}

/// Render the location catalog grouped by category.
pub fn render_catalog(catalog: &LocationCatalog) -> String {
    let mut buffer = String::new();
    for (category, labels) in &catalog.groups {
        let _ = writeln!(buffer, "{category}:");
        for label in labels {
            match catalog.floors.get(label) {
                Some(floor) => {
                    let _ = writeln!(buffer, "  {label} (floor {floor})");
                }
                None => {
                    let _ = writeln!(buffer, "  {label}");
                }
            }
        }
    }
    buffer
}

/// Short description of a point geometry, for log lines and headers.
pub fn describe_point(geometry: &Geometry) -> String {
    match geometry {
        Geometry::Point { coordinates } => {
            format!("{:.6}, {:.6}", coordinates[0], coordinates[1])
        }
        Geometry::LineString { coordinates } => format!("line of {} points", coordinates.len()),
    }
}

fn format_cost(cost: f64) -> String {
    if cost.fract() == 0.0 && cost.abs() < 1e15 {
        format!("{cost:.0}")
    } else {
        format!("{cost:.2}")
    }
}
