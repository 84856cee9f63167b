//! Results table persistence.
//!
//! The sweep writes its table as CSV keyed by the experiment index, with
//! human-readable column names; JSON export of the same rows is available for
//! downstream tooling.

use std::path::Path;

use crate::results::SweepResultTable;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;
#[path = "export/writer_utils.rs"]
mod writer_utils;

pub use self::csv::RESULT_COLUMNS;

/// Export the results table to CSV.
///
/// An empty table still produces the header row.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn export_to_csv(
    table: &SweepResultTable,
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    csv::export_to_csv_impl(table, file)
}

/// Export the results table to JSON (an array of row objects).
///
/// # Errors
///
/// Returns an error if file creation or JSON serialization fails.
pub fn export_to_json(
    table: &SweepResultTable,
    path: impl AsRef<Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = writer_utils::create_output_file(path)?;
    json::export_to_json_impl(table, file)
}
