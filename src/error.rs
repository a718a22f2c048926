//! Error types for the report engine

use std::path::PathBuf;

pub type Result<T, E = ReportError> = std::result::Result<T, E>;

/// Errors surfaced by the library.
///
/// Only loading and explicit lookups fail; interactive operations on absent
/// optional elements are no-ops instead.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid report document: {0}")]
    InvalidDocument(#[source] serde_json::Error),

    #[error("unknown test status: {0}")]
    UnknownStatus(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no test with id '{0}'")]
    UnknownTest(String),

    #[error("test '{test}' has no detail entry '{key}'")]
    UnknownDetail { test: String, key: String },

    #[error("preference store: {0}")]
    Preferences(String),

    #[error("unknown sort column: {0}")]
    UnknownColumn(String),
}
