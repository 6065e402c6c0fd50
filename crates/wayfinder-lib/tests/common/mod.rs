//! Shared fixture helpers for integration tests.
//!
//! Fixture databases are materialized from SQL into a temporary directory so
//! each test owns its copy and can add or break rows freely.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tempfile::TempDir;
use wayfinder_lib::{load_building, Building, GeoPoint};

/// Geographic point a few centimetres from the floor 0 restroom (node 5).
pub const NEAR_GROUND_RESTROOM: GeoPoint = GeoPoint {
    lon: 21.014_575,
    lat: 52.224_647,
};

/// Geographic point a few centimetres from the floor 1 restroom (node 9).
pub const NEAR_UPPER_RESTROOM: GeoPoint = GeoPoint {
    lon: 21.014_287,
    lat: 52.224_742,
};

/// Directory holding the SQL fixtures.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// SQL script describing the sample building.
pub fn sample_building_sql() -> String {
    fs::read_to_string(fixtures_dir().join("sample_building.sql"))
        .expect("sample_building.sql fixture present")
}

/// A SQLite database living in its own temporary directory.
pub struct FixtureDb {
    _temp_dir: TempDir,
    pub path: PathBuf,
}

impl FixtureDb {
    /// Create a database from an SQL script.
    pub fn from_sql(sql: &str) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let path = temp_dir.path().join("building.db");
        let conn = Connection::open(&path).expect("create fixture database");
        conn.execute_batch(sql).expect("apply fixture SQL");
        Self {
            _temp_dir: temp_dir,
            path,
        }
    }

    /// The sample building.
    pub fn sample() -> Self {
        Self::from_sql(&sample_building_sql())
    }

    /// The sample building with extra statements applied on top.
    pub fn sample_with(extra_sql: &str) -> Self {
        let fixture = Self::sample();
        let conn = Connection::open(&fixture.path).expect("reopen fixture database");
        conn.execute_batch(extra_sql).expect("apply extra SQL");
        fixture
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Building {
        load_building(&self.path).expect("fixture building loads")
    }
}

/// Load the sample building.
pub fn sample_building() -> Building {
    FixtureDb::sample().load()
}
