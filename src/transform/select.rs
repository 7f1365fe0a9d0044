use std::collections::HashSet;
use tracing::warn;

use crate::errors::{EtlError, EtlResult, Stage};
use crate::table::{Column, Table};

/// Projects `table` onto exactly `columns`, in that order.
///
/// Names absent from the input become all-null columns, so fixed-schema
/// writers can rely on every configured column being present. A name
/// requested twice is a `Select` stage error, since a table holds each
/// column name once.
pub fn select_columns(table: &Table, columns: &[String]) -> EtlResult<Table> {
    let mut seen = HashSet::new();
    if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
        return Err(EtlError::stage(
            Stage::Select,
            Some(dup),
            "column requested more than once",
        ));
    }

    let height = if table.width() == 0 { 0 } else { table.height() };

    let mut out = Vec::with_capacity(columns.len());
    for name in columns {
        match table.lookup(name) {
            Ok(column) => out.push(column.clone()),
            Err(issue) => {
                warn!(
                    stage = %Stage::Select,
                    column = %name,
                    %issue,
                    "Configured output column absent, adding it empty"
                );
                out.push(Column::nulls(name.clone(), height));
            }
        }
    }

    Table::from_columns(out).map_err(|e| e.in_stage(Stage::Select, None))
}
