//! CSV rendering for export documents

use super::types::ExportDocument;
use chrono::{DateTime, TimeZone};
use std::borrow::Cow;
use std::fmt::Write;

/// Prefix of exported file names
pub const FILENAME_PREFIX: &str = "racecapture_data";

impl ExportDocument {
    /// Render as CSV: the header line, then elapsed seconds (two decimals)
    /// and each channel value per row
    pub fn to_csv(&self) -> String {
        let mut out = String::new();

        let header: Vec<Cow<'_, str>> = self.columns.iter().map(|c| escape_field(c)).collect();
        out.push_str(&header.join(","));
        out.push('\n');

        for row in &self.rows {
            // Writing into a String cannot fail
            let _ = write!(out, "{:.2}", row.elapsed.as_secs_f64());
            for value in &row.values {
                let _ = write!(out, ",{}", value);
            }
            out.push('\n');
        }

        out
    }
}

/// `racecapture_data_<YYYYMMDD_HHMMSS>.csv`
pub fn export_filename<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}.csv", FILENAME_PREFIX, at.format("%Y%m%d_%H%M%S"))
}

fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
