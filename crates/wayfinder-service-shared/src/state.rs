//! Application state for HTTP services.
//!
//! Handlers never hold the lock: they take an `Arc<Building>` snapshot and
//! drop it when the request finishes. A reload builds the new snapshot off to
//! the side and swaps the pointer, so in-flight requests complete against the
//! building they started with.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use wayfinder_lib::{load_building, Building, Error as LibError, SearchBudget};

/// Default per-request search budget.
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_millis(2000);

/// Error during application state initialization or reload.
#[derive(Debug)]
pub enum AppStateError {
    /// Failed to load the building database.
    BuildingLoad(LibError),

    /// Database file not found.
    DatabaseNotFound(String),

    /// State was built from in-memory parts and has no database to reload from.
    ReloadUnavailable,
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuildingLoad(e) => write!(f, "failed to load building: {}", e),
            Self::DatabaseNotFound(path) => write!(f, "database not found: {}", path),
            Self::ReloadUnavailable => f.write_str("state has no backing database to reload"),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BuildingLoad(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LibError> for AppStateError {
    fn from(err: LibError) -> Self {
        Self::BuildingLoad(err)
    }
}

/// Counts describing a loaded snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub nodes: usize,
    pub locations: usize,
    pub edges: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Shared application state for all axum handlers.
///
/// Cheaply cloneable; share it via axum's `State` extractor.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::post, extract::State};
/// use wayfinder_service_shared::AppState;
///
/// async fn handler(State(state): State<AppState>) {
///     let building = state.snapshot();
///     // ... use building
/// }
///
/// let state = AppState::load("path/to/building.db", DEFAULT_SEARCH_TIMEOUT).unwrap();
/// let app = Router::new()
///     .route("/api/v1/route", post(handler))
///     .with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db_path: Option<PathBuf>,
    current: RwLock<Snapshot>,
    search_timeout: Duration,
}

#[derive(Clone)]
struct Snapshot {
    building: Arc<Building>,
    loaded_at: DateTime<Utc>,
}

impl Snapshot {
    fn new(building: Building) -> Self {
        Self {
            building: Arc::new(building),
            loaded_at: Utc::now(),
        }
    }

    fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            nodes: self.building.node_count(),
            locations: self.building.locations().len(),
            edges: self.building.edges().len(),
            loaded_at: self.loaded_at,
        }
    }
}

impl AppState {
    /// Load application state from a building database.
    pub fn load(
        db_path: impl AsRef<Path>,
        search_timeout: Duration,
    ) -> Result<Self, AppStateError> {
        let db_path = db_path.as_ref();
        let snapshot = Snapshot::new(read_building(db_path)?);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                db_path: Some(db_path.to_path_buf()),
                current: RwLock::new(snapshot),
                search_timeout,
            }),
        })
    }

    /// Create application state from an already-loaded building.
    ///
    /// Such state cannot be reloaded.
    pub fn from_building(building: Building, search_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                db_path: None,
                current: RwLock::new(Snapshot::new(building)),
                search_timeout,
            }),
        }
    }

    /// Current building snapshot.
    pub fn snapshot(&self) -> Arc<Building> {
        self.current().building
    }

    pub fn summary(&self) -> SnapshotSummary {
        self.current().summary()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.current().loaded_at
    }

    pub fn data_path(&self) -> Option<&Path> {
        self.inner.db_path.as_deref()
    }

    pub fn search_timeout(&self) -> Duration {
        self.inner.search_timeout
    }

    /// Fresh budget for one route computation.
    pub fn search_budget(&self) -> SearchBudget {
        SearchBudget::with_timeout(self.inner.search_timeout)
    }

    /// Re-read the database and swap in the new snapshot.
    ///
    /// On failure the current snapshot stays in place.
    pub fn reload(&self) -> Result<SnapshotSummary, AppStateError> {
        let db_path = self
            .inner
            .db_path
            .as_deref()
            .ok_or(AppStateError::ReloadUnavailable)?;
        let snapshot = Snapshot::new(read_building(db_path)?);
        let summary = snapshot.summary();

        let mut current = self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = snapshot;

        tracing::info!(
            nodes = summary.nodes,
            locations = summary.locations,
            edges = summary.edges,
            "building snapshot replaced"
        );
        Ok(summary)
    }

    fn current(&self) -> Snapshot {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn read_building(db_path: &Path) -> Result<Building, AppStateError> {
    if !db_path.exists() {
        return Err(AppStateError::DatabaseNotFound(
            db_path.display().to_string(),
        ));
    }

    tracing::info!(path = %db_path.display(), "loading building");
    let building = load_building(db_path)?;
    tracing::info!(
        nodes = building.node_count(),
        locations = building.locations().len(),
        edges = building.edges().len(),
        coordinate_system = %building.coordinate_system(),
        "building loaded successfully"
    );
    Ok(building)
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let summary = self.summary();
        f.debug_struct("AppState")
            .field("db_path", &self.inner.db_path)
            .field("nodes", &summary.nodes)
            .field("locations", &summary.locations)
            .field("search_timeout", &self.inner.search_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fixture_building, FixtureDb};

    #[test]
    fn test_app_state_from_building() {
        let state = AppState::from_building(fixture_building(), DEFAULT_SEARCH_TIMEOUT);

        assert_eq!(state.summary().locations, 7);
        assert!(state.data_path().is_none());
        assert!(matches!(
            state.reload(),
            Err(AppStateError::ReloadUnavailable)
        ));
    }

    #[test]
    fn test_app_state_clone_shares_snapshot() {
        let state1 = AppState::from_building(fixture_building(), DEFAULT_SEARCH_TIMEOUT);
        let state2 = state1.clone();

        assert!(Arc::ptr_eq(&state1.snapshot(), &state2.snapshot()));
    }

    #[test]
    fn test_reload_swaps_snapshot_but_keeps_old_one_alive() {
        let fixture = FixtureDb::sample();
        let state = AppState::load(&fixture.path, DEFAULT_SEARCH_TIMEOUT).unwrap();
        let before = state.snapshot();

        fixture.execute("INSERT INTO locations VALUES (8, 'Seminar Room', 'classroom', 1);");
        let summary = state.reload().unwrap();

        assert_eq!(summary.locations, 8);
        assert_eq!(before.locations().len(), 7);
        assert!(!Arc::ptr_eq(&before, &state.snapshot()));
        assert_eq!(state.snapshot().find_nodes_by_label("Seminar Room"), vec![8]);
    }

    #[test]
    fn test_failed_reload_keeps_current_snapshot() {
        let fixture = FixtureDb::sample();
        let state = AppState::load(&fixture.path, DEFAULT_SEARCH_TIMEOUT).unwrap();

        fixture.execute("UPDATE edges SET cost = -1 WHERE id = 1;");
        assert!(matches!(
            state.reload(),
            Err(AppStateError::BuildingLoad(LibError::InvalidGraphData { .. }))
        ));
        assert_eq!(state.snapshot().edges().len(), 13);
    }

    #[test]
    fn test_app_state_debug() {
        let state = AppState::from_building(fixture_building(), DEFAULT_SEARCH_TIMEOUT);
        let debug = format!("{:?}", state);

        assert!(debug.contains("AppState"));
        assert!(debug.contains("locations"));
    }

    #[test]
    fn test_app_state_load_nonexistent() {
        let result = AppState::load("/nonexistent/path/to/building.db", DEFAULT_SEARCH_TIMEOUT);

        match result.unwrap_err() {
            AppStateError::DatabaseNotFound(path) => {
                assert!(path.contains("nonexistent"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
