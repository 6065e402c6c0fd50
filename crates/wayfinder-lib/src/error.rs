use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Convenient result alias for the wayfinding library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Request fields were missing or malformed; raised before any search work.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// No location matched the requested start label.
    #[error("unknown start location: {label}{}", format_suggestions(.suggestions))]
    UnknownStartLocation {
        label: String,
        suggestions: Vec<String>,
    },

    /// No location matched the requested end label.
    #[error("unknown end location: {label}{}", format_suggestions(.suggestions))]
    UnknownEndLocation {
        label: String,
        suggestions: Vec<String>,
    },

    /// No candidate pair is connected in the circulation graph.
    #[error("no route found between {start} and {end}")]
    NoRouteFound { start: String, end: String },

    /// The search exhausted its time or work budget.
    #[error("route search exceeded its budget after {} ms", .elapsed.as_millis())]
    SearchTimeout { elapsed: Duration },

    /// The graph data violates a load-time invariant (negative cost, bad geometry, ...).
    #[error("invalid graph data: {message}")]
    InvalidGraphData { message: String },

    /// The database does not contain the expected tables or columns.
    #[error("unsupported building schema; expected nodes/locations/edges tables")]
    UnsupportedSchema,

    /// The graph store could not be opened.
    #[error("building database not available at {path}")]
    StoreUnavailable { path: PathBuf },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON decoding errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_graph(message: impl Into<String>) -> Self {
        Error::InvalidGraphData {
            message: message.into(),
        }
    }
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_location_lists_single_suggestion() {
        let err = Error::UnknownStartLocation {
            label: "Restrom".to_string(),
            suggestions: vec!["Restroom".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "unknown start location: Restrom. Did you mean 'Restroom'?"
        );
    }

    #[test]
    fn unknown_location_without_suggestions_is_plain() {
        let err = Error::UnknownEndLocation {
            label: "Nowhere".to_string(),
            suggestions: Vec::new(),
        };
        assert_eq!(err.to_string(), "unknown end location: Nowhere");
    }

    #[test]
    fn search_timeout_reports_milliseconds() {
        let err = Error::SearchTimeout {
            elapsed: Duration::from_millis(1500),
        };
        assert!(err.to_string().contains("1500 ms"));
    }
}
