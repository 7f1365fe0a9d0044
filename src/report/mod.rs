//! Top/flop article report built on the transformed table.

pub mod categories;
pub mod ranking;

pub use categories::CategoryMap;
pub use ranking::{Ranking, rank};

use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::LINK;
use crate::errors::{EtlError, EtlResult, Stage};
use crate::output::write_csv;
use crate::table::{Column, Table, Value};

const CATEGORY: &str = "category";
const PERMALINK_PATTERN: &str = r"p=\d+$";

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub top: Table,
    pub flop: Table,
    pub all: Table,
}

/// Removes rows whose `link` is a bare `?p=<id>` permalink.
pub fn drop_permalinks(table: &Table) -> EtlResult<Table> {
    let Some(links) = table.column(LINK) else {
        warn!(column = LINK, "Column missing, skipping permalink filter");
        return Ok(table.clone());
    };
    let pattern = Regex::new(PERMALINK_PATTERN)
        .map_err(|e| EtlError::stage(Stage::Report, Some(LINK), e.to_string()))?;

    let filtered = table.filter_rows(|i| {
        links.values[i]
            .as_str()
            .is_none_or(|link| !pattern.is_match(link))
    });
    info!(
        removed = table.height() - filtered.height(),
        "Filtered out permalink rows"
    );
    Ok(filtered)
}

/// Replaces the `category` column with categories derived from each link.
/// Tables without a `category` column are left unchanged.
pub fn apply_categories(table: &mut Table, categories: &CategoryMap) -> EtlResult<()> {
    if !table.contains(CATEGORY) {
        warn!(column = CATEGORY, "Column missing, skipping category mapping");
        return Ok(());
    }
    let mapped: Vec<Value> = (0..table.height())
        .map(|i| {
            let link = table.value(i, LINK).map(Value::to_string).unwrap_or_default();
            Value::text(categories.map_category(&link))
        })
        .collect();
    table
        .push_column(Column::new(CATEGORY, mapped))
        .map_err(|e| e.in_stage(Stage::Report, Some(CATEGORY)))
}

/// Filters, categorizes and ranks the transformed table.
///
/// Empty top or flop selections are replaced by a one-column `message`
/// table so that every report file is written.
#[tracing::instrument(skip_all, fields(rows = table.height(), top_only = top_only))]
pub fn run_report(table: Table, categories: &CategoryMap, top_only: bool) -> EtlResult<Report> {
    let mut all = drop_permalinks(&table)?;
    apply_categories(&mut all, categories)?;

    let ranking = if all.height() == 0 {
        warn!("Nothing to rank");
        None
    } else {
        rank(&mut all, top_only)
    };

    let (top, flop) = match ranking {
        Some(Ranking { top, flop }) => (top, flop),
        None => (Table::new(), Table::new()),
    };

    let top = or_message(top, "No top articles identified with current criteria.")?;
    let flop = or_message(flop, "No flop articles identified with current criteria.")?;
    Ok(Report { top, flop, all })
}

fn or_message(table: Table, message: &str) -> EtlResult<Table> {
    if table.height() > 0 {
        return Ok(table);
    }
    Table::from_rows(&["message"], vec![vec![Value::text(message)]])
}

/// Output file names for a report run: `[<prefix>_]td_report_<kind>.csv`.
pub fn report_paths(dir: &Path, prefix: &str) -> [PathBuf; 3] {
    let prefix = if prefix.is_empty() {
        String::new()
    } else {
        format!("{prefix}_")
    };
    ["top", "flop", "all_articles"].map(|kind| dir.join(format!("{prefix}td_report_{kind}.csv")))
}

/// Writes the three report tables and returns their paths.
pub fn write_report(report: &Report, dir: &Path, prefix: &str) -> EtlResult<[PathBuf; 3]> {
    let paths = report_paths(dir, prefix);
    let [top, flop, all] = &paths;
    write_csv(top, &report.top, false)?;
    write_csv(flop, &report.flop, false)?;
    write_csv(all, &report.all, false)?;
    Ok(paths)
}
