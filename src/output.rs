//! Output formatting and persistence for transformed tables.
//!
//! Supports debug summaries, JSON summaries, and CSV export (optionally gzip).

use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::EtlResult;
use crate::table::Table;

/// Shape and completeness of a table.
#[derive(Debug, Serialize)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

#[derive(Debug, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub nulls: usize,
}

impl TableSummary {
    pub fn of(table: &Table) -> Self {
        Self {
            rows: table.height(),
            columns: table
                .columns()
                .iter()
                .map(|c| ColumnSummary {
                    name: c.name.clone(),
                    nulls: c.null_count(),
                })
                .collect(),
        }
    }
}

/// Logs the table shape and column names at debug level.
pub fn print_summary(table: &Table) {
    debug!(
        rows = table.height(),
        columns = ?table.names(),
        "Table summary"
    );
}

/// Pretty-printed JSON summary of the table (rows, columns, null counts).
pub fn summary_json(table: &Table) -> EtlResult<String> {
    Ok(serde_json::to_string_pretty(&TableSummary::of(table))?)
}

/// Serializes `table` as CSV: header row, then one line per row. Nulls are
/// written as empty cells.
pub fn to_csv_bytes(table: &Table) -> EtlResult<Vec<u8>> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(table.names())?;
    for idx in 0..table.height() {
        writer.write_record(table.row(idx).iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| e.into_error().into())
}

/// Writes `table` to `path`, creating parent directories. With `gzip` the
/// bytes are gzip-compressed; the caller picks the file name.
pub fn write_csv(path: impl AsRef<Path>, table: &Table, gzip: bool) -> EtlResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let body = to_csv_bytes(table)?;
    let body = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body)?;
        encoder.finish()?
    } else {
        body
    };

    let mut file = File::create(path)?;
    file.write_all(&body)?;
    info!(
        path = %path.display(),
        rows = table.height(),
        gzip,
        "Wrote CSV"
    );
    Ok(())
}
