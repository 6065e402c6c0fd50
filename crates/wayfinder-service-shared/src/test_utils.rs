//! Test utilities for service handler testing.
//!
//! Fixture databases are built from `docs/fixtures/sample_building.sql` into a
//! temporary directory, so every test that needs a database file gets its own.

use std::path::PathBuf;
use std::sync::OnceLock;

use rusqlite::Connection;
use tempfile::TempDir;
use wayfinder_lib::{load_building, Building};

use crate::state::{AppState, DEFAULT_SEARCH_TIMEOUT};

/// Path to the SQL script describing the sample building.
pub const FIXTURE_SQL_PATH: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../../docs/fixtures/sample_building.sql"
);

/// Lazily-initialized in-memory test state.
static TEST_STATE: OnceLock<AppState> = OnceLock::new();

/// A fixture database that lives as long as this value.
pub struct FixtureDb {
    _temp_dir: TempDir,
    pub path: PathBuf,
}

impl FixtureDb {
    /// Materialize the sample building.
    ///
    /// # Panics
    ///
    /// Panics if the fixture cannot be written; that is a test setup problem.
    pub fn sample() -> Self {
        let sql = std::fs::read_to_string(FIXTURE_SQL_PATH)
            .unwrap_or_else(|e| panic!("failed to read {FIXTURE_SQL_PATH}: {e}"));
        let temp_dir = TempDir::new().expect("create temp dir");
        let path = temp_dir.path().join("building.db");
        let conn = Connection::open(&path).expect("create fixture database");
        conn.execute_batch(&sql).expect("apply fixture SQL");
        Self {
            _temp_dir: temp_dir,
            path,
        }
    }

    /// Run extra SQL against the fixture database.
    pub fn execute(&self, sql: &str) {
        let conn = Connection::open(&self.path).expect("open fixture database");
        conn.execute_batch(sql).expect("apply SQL");
    }
}

/// Load the sample building into memory.
pub fn fixture_building() -> Building {
    let fixture = FixtureDb::sample();
    load_building(&fixture.path).expect("sample building loads")
}

/// Shared in-memory test state. Cannot be reloaded.
pub fn test_state() -> AppState {
    TEST_STATE
        .get_or_init(|| AppState::from_building(fixture_building(), DEFAULT_SEARCH_TIMEOUT))
        .clone()
}

/// Test state backed by a fixture database, for reload tests.
///
/// Keep the returned [`FixtureDb`] alive for as long as the state is used.
pub fn test_state_with_db() -> (AppState, FixtureDb) {
    let fixture = FixtureDb::sample();
    let state = AppState::load(&fixture.path, DEFAULT_SEARCH_TIMEOUT)
        .unwrap_or_else(|e| panic!("failed to load fixture from {:?}: {}", fixture.path, e));
    (state, fixture)
}

/// Location labels present in the sample building.
pub mod fixture_locations {
    /// Ground floor entrance.
    pub const MAIN_ENTRANCE: &str = "Main Entrance";

    /// Exists on floor 0 and floor 1.
    pub const RESTROOM: &str = "Restroom";

    /// Reachable from the entrance; returns through a one-way door.
    pub const CAFE: &str = "Cafe";

    /// Not connected to the circulation graph.
    pub const STORAGE: &str = "Storage";

    /// Reachable only by stairs.
    pub const ROOF_TERRACE: &str = "Roof Terrace";
}

/// Generate a unique request ID for testing.
pub fn test_request_id() -> String {
    format!("test-{}", uuid::Uuid::now_v7())
}
