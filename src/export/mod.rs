//! Recording export module
//!
//! This module turns recorded rows into CSV documents and delivers them to
//! a sink (HTTP download or a file on local storage).

pub mod csv;
pub mod sink;
pub mod types;

pub use csv::export_filename;
pub use sink::{CsvDownload, DownloadSink, ExportSink, FileSink};
pub use types::{ExportDocument, ExportError, TIMESTAMP_COLUMN};
