//! Export types
//!
//! This module defines the exported document and the errors an export
//! sink can report.

use crate::recorder::RecordedRow;
use thiserror::Error;

/// Header of the elapsed-time column
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid export target: {0}")]
    InvalidTarget(String),
}

/// Snapshot of a recording session's rows, detached from the store
///
/// Every sink renders the same document shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    /// `Timestamp` followed by channel names in registry order
    pub columns: Vec<String>,
    pub rows: Vec<RecordedRow>,
}

impl ExportDocument {
    /// Build a document for the given channel names
    pub fn new<'a>(channel_names: impl IntoIterator<Item = &'a str>, rows: Vec<RecordedRow>) -> Self {
        let columns = std::iter::once(TIMESTAMP_COLUMN)
            .chain(channel_names)
            .map(str::to_string)
            .collect();

        Self { columns, rows }
    }
}
