use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between opening the dataset and handing
/// aggregate tables to the charts.
///
/// An empty filter result is deliberately absent: it is a normal outcome and
/// every aggregation returns an empty table for it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    #[error("dataset unavailable at {path:?}: {reason}")]
    DataUnavailable { path: PathBuf, reason: String },

    #[error("dataset schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("row {row}, column '{column}': {reason}")]
    InvalidValue {
        row: usize,
        column: &'static str,
        reason: String,
    },

    #[error("invalid hour range {min}..={max} (expected 0 <= min <= max <= 23)")]
    InvalidFilterRange { min: u8, max: u8 },
}

impl DashboardError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        DashboardError::DataUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
