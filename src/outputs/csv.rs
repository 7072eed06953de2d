//! CSV report writer.
//!
//! The header row is always written, so a run that finds nothing still
//! leaves a well-formed, empty table behind.

use crate::error::Result;
use crate::models::ReportRow;
use std::io;
use std::path::Path;
use tracing::{info, instrument};

pub const HEADER: [&str; 2] = ["Name", "Link"];

/// Write the header and `rows` to any writer. Returns the number of rows.
pub fn write_rows<W: io::Write>(writer: W, rows: &[ReportRow]) -> Result<usize> {
    let mut csv = ::csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(HEADER)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(rows.len())
}

/// Create (or truncate) the report at `path` and write `rows` to it.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    let written = write_rows(io::BufWriter::new(file), rows)?;
    info!(rows = written, "Wrote CSV report");
    Ok(written)
}
