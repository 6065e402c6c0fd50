//! Output formatting for CLI results.
//!
//! Text output reuses the library renderers; JSON output serializes the
//! library types as-is so scripts see the same shapes as the HTTP API.

use std::io::Write;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use wayfinder_lib::{
    render_catalog, render_route, LocationCatalog, RouteRenderMode, RouteResult,
};

use crate::commands::validate::BuildingReport;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

pub fn write_route(
    out: &mut impl Write,
    route: &RouteResult,
    format: OutputFormat,
    mode: RouteRenderMode,
) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(out, &render_route(route, mode)),
        OutputFormat::Json => write_json(out, route),
    }
}

pub fn write_catalog(
    out: &mut impl Write,
    catalog: &LocationCatalog,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text if catalog.groups.is_empty() => {
            write_text(out, "No locations defined.\n")
        }
        OutputFormat::Text => write_text(out, &render_catalog(catalog)),
        OutputFormat::Json => write_json(out, catalog),
    }
}

pub fn write_report(
    out: &mut impl Write,
    report: &BuildingReport,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => write_text(out, &report.render()),
        OutputFormat::Json => write_json(out, report),
    }
}

fn write_text(out: &mut impl Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .context("failed to write output")
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to serialize output")?;
    writeln!(out).context("failed to write output")
}
