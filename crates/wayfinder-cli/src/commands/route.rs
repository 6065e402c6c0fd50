//! `route` subcommand: cheapest route between two labelled locations.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use wayfinder_lib::{
    compute_route, Building, GeoPoint, RouteRenderMode, RouteRequest, SearchBudget,
};

use crate::data::open_building;
use crate::output::{write_route, OutputFormat};

/// Arguments for the route command.
#[derive(Debug, Clone, Args)]
pub struct RouteCommandArgs {
    /// Start location label.
    #[arg(long = "from")]
    pub from: String,

    /// End location label.
    #[arg(long = "to")]
    pub to: String,

    /// Use stairs only when nothing else connects the two locations.
    #[arg(long)]
    pub avoid_stairs: bool,

    /// Pick the start instance nearest to this point ("lon,lat").
    #[arg(long, value_name = "LON,LAT", value_parser = parse_point)]
    pub start_at: Option<GeoPoint>,

    /// Pick the end instance nearest to this point ("lon,lat").
    #[arg(long, value_name = "LON,LAT", value_parser = parse_point)]
    pub end_at: Option<GeoPoint>,

    /// Summarize the route per floor instead of per segment.
    #[arg(long)]
    pub by_floor: bool,

    /// Give up after this many milliseconds of searching.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,
}

impl RouteCommandArgs {
    /// Convert CLI args to a library request.
    pub fn to_request(&self) -> RouteRequest {
        let budget = match self.timeout_ms {
            Some(ms) => SearchBudget::with_timeout(Duration::from_millis(ms)),
            None => SearchBudget::unlimited(),
        };
        let mut request = RouteRequest::new(self.from.as_str(), self.to.as_str())
            .avoid_stairs(self.avoid_stairs)
            .with_budget(budget);
        if let Some(point) = self.start_at {
            request = request.with_start_tie_break(point);
        }
        if let Some(point) = self.end_at {
            request = request.with_end_tie_break(point);
        }
        request
    }

    pub fn render_mode(&self) -> RouteRenderMode {
        if self.by_floor {
            RouteRenderMode::Floors
        } else {
            RouteRenderMode::PlainText
        }
    }
}

/// Parse "lon,lat" in decimal degrees.
pub fn parse_point(raw: &str) -> Result<GeoPoint, String> {
    let (lon, lat) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LON,LAT but got '{raw}'"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let point = GeoPoint::new(lon, lat);
    if !point.is_valid() {
        return Err(format!("{point} is outside the longitude/latitude range"));
    }
    Ok(point)
}

/// Handle the route subcommand.
pub fn handle_route_command(
    data_path: Option<&Path>,
    format: OutputFormat,
    args: &RouteCommandArgs,
) -> Result<()> {
    let (_, building) = open_building(data_path)?;
    let stdout = std::io::stdout();
    run_route(&building, args, format, &mut stdout.lock())
}

/// Compute and print a route against an already-loaded building.
pub fn run_route(
    building: &Building,
    args: &RouteCommandArgs,
    format: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let route = compute_route(building, &args.to_request())?;
    write_route(out, &route, format, args.render_mode())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(from: &str, to: &str) -> RouteCommandArgs {
        RouteCommandArgs {
            from: from.to_string(),
            to: to.to_string(),
            avoid_stairs: false,
            start_at: None,
            end_at: None,
            by_floor: false,
            timeout_ms: None,
        }
    }

    #[test]
    fn parse_point_accepts_lon_lat() {
        assert_eq!(
            parse_point("21.0145, 52.2246").unwrap(),
            GeoPoint::new(21.0145, 52.2246)
        );
    }

    #[test]
    fn parse_point_rejects_garbage() {
        assert!(parse_point("21.0").unwrap_err().contains("LON,LAT"));
        assert!(parse_point("east,52").unwrap_err().contains("longitude"));
        assert!(parse_point("21,95").unwrap_err().contains("range"));
    }

    #[test]
    fn request_carries_options() {
        let mut args = args("Cafe", "Restroom");
        args.avoid_stairs = true;
        args.end_at = Some(GeoPoint::new(21.0, 52.0));
        args.timeout_ms = Some(50);

        let request = args.to_request();
        assert!(request.avoid_stairs);
        assert_eq!(request.end_tie_break, Some(GeoPoint::new(21.0, 52.0)));
        assert!(request.start_tie_break.is_none());
        assert_ne!(request.budget, SearchBudget::unlimited());
    }

    #[test]
    fn render_mode_follows_flag() {
        let mut args = args("Cafe", "Restroom");
        assert_eq!(args.render_mode(), RouteRenderMode::PlainText);
        args.by_floor = true;
        assert_eq!(args.render_mode(), RouteRenderMode::Floors);
    }
}
