//! `locations` subcommand: list selectable locations by category.

use std::path::Path;

use anyhow::Result;

use wayfinder_lib::list_locations;

use crate::data::open_building;
use crate::output::{write_catalog, OutputFormat};

pub fn handle_locations_command(data_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let (_, building) = open_building(data_path)?;
    let catalog = list_locations(&building);
    let stdout = std::io::stdout();
    write_catalog(&mut stdout.lock(), &catalog, format)
}
