//! Export sinks
//!
//! A sink takes a rendered export document somewhere: back to the browser
//! as a download, or into a file on local storage (the dashboard's "SD
//! card" target).

use super::csv::export_filename;
use super::types::{ExportDocument, ExportError};
use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

/// Suffixes tried before a save into one directory gives up
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Destination for an export document
pub trait ExportSink {
    /// What the caller gets back once the document is delivered
    type Receipt;

    fn deliver(&self, document: &ExportDocument) -> Result<Self::Receipt, ExportError>;
}

/// CSV body ready to stream as an attachment
#[derive(Debug, Clone, PartialEq)]
pub struct CsvDownload {
    pub filename: String,
    pub body: String,
}

impl CsvDownload {
    /// `Content-Disposition` header value
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }
}

/// Renders the document in memory for an HTTP download
#[derive(Debug, Clone)]
pub struct DownloadSink {
    generated_at: DateTime<Local>,
}

impl DownloadSink {
    pub fn new() -> Self {
        Self::at(Local::now())
    }

    pub fn at(generated_at: DateTime<Local>) -> Self {
        Self { generated_at }
    }
}

impl Default for DownloadSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportSink for DownloadSink {
    type Receipt = CsvDownload;

    fn deliver(&self, document: &ExportDocument) -> Result<CsvDownload, ExportError> {
        Ok(CsvDownload {
            filename: export_filename(&self.generated_at),
            body: document.to_csv(),
        })
    }
}

/// Writes the document as a timestamped CSV file inside a directory
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
    generated_at: DateTime<Local>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::at(dir, Local::now())
    }

    pub fn at(dir: impl Into<PathBuf>, generated_at: DateTime<Local>) -> Self {
        Self {
            dir: dir.into(),
            generated_at,
        }
    }

    /// Path for the given attempt: the timestamped name, then `_1`, `_2`, ...
    fn candidate(&self, attempt: u32) -> PathBuf {
        let name = export_filename(&self.generated_at);
        if attempt == 0 {
            return self.dir.join(name);
        }

        let stem = name.strip_suffix(".csv").unwrap_or(name.as_str());
        self.dir.join(format!("{}_{}.csv", stem, attempt))
    }

    /// Create the first free candidate, never replacing an existing file
    fn create_unique(&self) -> Result<(PathBuf, File), ExportError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.candidate(attempt);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(ExportError::InvalidTarget(format!(
            "no free file name for {} in {}",
            export_filename(&self.generated_at),
            self.dir.display()
        )))
    }
}

impl ExportSink for FileSink {
    type Receipt = PathBuf;

    fn deliver(&self, document: &ExportDocument) -> Result<PathBuf, ExportError> {
        if self.dir.as_os_str().is_empty() {
            return Err(ExportError::InvalidTarget("empty directory path".to_string()));
        }
        if self.dir.exists() && !self.dir.is_dir() {
            return Err(ExportError::InvalidTarget(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }

        fs::create_dir_all(&self.dir)?;

        let (path, mut file) = self.create_unique()?;
        file.write_all(document.to_csv().as_bytes())?;
        file.flush()?;

        tracing::info!(
            "Exported {} rows to {:?}",
            document.rows.len(),
            path
        );

        Ok(path)
    }
}
