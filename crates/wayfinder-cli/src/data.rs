//! Locating the building database.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::debug;

use wayfinder_lib::{load_building, Building};

/// File name used inside the platform data directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "building.db";

/// Pick the database path.
///
/// An explicit path (from `--data` or `WAYFINDER_DATA_PATH`) wins; otherwise
/// the file lives in the platform data directory, e.g.
/// `~/.local/share/wayfinder/building.db` on Linux.
pub fn resolve_data_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let dirs = ProjectDirs::from("org", "wayfinder", "wayfinder")
        .context("could not determine a data directory; pass --data")?;
    Ok(dirs.data_dir().join(DEFAULT_DATABASE_FILENAME))
}

/// Resolve and load the building in one step.
pub fn open_building(explicit: Option<&Path>) -> Result<(PathBuf, Building)> {
    let path = resolve_data_path(explicit)?;
    debug!(path = %path.display(), "loading building");
    let building = load_building(&path)
        .with_context(|| format!("failed to load building from {}", path.display()))?;
    Ok((path, building))
}
