//! Canonicalizes the raw GA4 traffic export and the WordPress content export.

use tracing::{debug, warn};

use crate::config::{LINK, LINKDEX, PAGEPATH, PUBDATE, TransformConfig};
use crate::errors::{EtlResult, Stage};
use crate::table::{Table, Value};
use crate::transform::normalize::normalize_url_path;

/// Renames GA4 columns, normalizes `pagepath` and coerces metrics to numbers.
pub fn clean_traffic(mut table: Table, config: &TransformConfig) -> EtlResult<Table> {
    if table.is_empty() {
        return Ok(Table::new());
    }

    for (from, to) in &config.traffic_renames {
        if table.rename(from, to) {
            debug!(from = %from, to = %to, "Renamed traffic column");
        }
    }

    match table.lookup(PAGEPATH) {
        Ok(column) => {
            let normalized = column.map(normalize_path_value);
            table.push_column(normalized).map_err(|e| e.in_stage(Stage::Clean, Some(PAGEPATH)))?;
        }
        Err(issue) => warn!(
            stage = %Stage::Clean,
            column = PAGEPATH,
            %issue,
            "Traffic data has no page path, skipping normalization"
        ),
    }

    let benchmarked: Vec<&str> = config.metrics.iter().map(|m| m.source.as_str()).collect();
    for metric in config.traffic_numeric_columns() {
        match table.lookup(&metric) {
            Ok(column) => {
                let coerced = column.map(Value::to_numeric);
                table.push_column(coerced).map_err(|e| e.in_stage(Stage::Clean, Some(&metric)))?;
            }
            Err(issue) if benchmarked.contains(&metric.as_str()) => warn!(
                stage = %Stage::Clean,
                column = %metric,
                %issue,
                "Benchmark metric missing from traffic data"
            ),
            Err(_) => {}
        }
    }

    Ok(table)
}

/// Derives `pagepath` from `link`, parses `pubdate` and coerces the Yoast linkdex.
pub fn clean_content(mut table: Table) -> EtlResult<Table> {
    if table.is_empty() {
        return Ok(Table::new());
    }

    match table.lookup(LINK) {
        Ok(column) => {
            let mut paths = column.map(normalize_path_value);
            paths.name = PAGEPATH.to_string();
            table.push_column(paths).map_err(|e| e.in_stage(Stage::Clean, Some(PAGEPATH)))?;
        }
        Err(issue) => warn!(
            stage = %Stage::Clean,
            column = LINK,
            %issue,
            "Content data has no link, cannot derive page path for merging"
        ),
    }

    match table.lookup(PUBDATE) {
        Ok(column) => {
            let dates = column.map(Value::to_datetime);
            table.push_column(dates).map_err(|e| e.in_stage(Stage::Clean, Some(PUBDATE)))?;
        }
        Err(issue) => warn!(
            stage = %Stage::Clean,
            column = PUBDATE,
            %issue,
            "Content data has no publication date, benchmarks will be empty"
        ),
    }

    if let Ok(column) = table.lookup(LINKDEX) {
        let coerced = column.map(Value::to_numeric);
        table.push_column(coerced).map_err(|e| e.in_stage(Stage::Clean, Some(LINKDEX)))?;
    }

    Ok(table)
}

fn normalize_path_value(value: &Value) -> Value {
    let raw = match value {
        Value::Text(s) => s.clone(),
        Value::Null => return Value::Null,
        other => other.to_string(),
    };
    normalize_url_path(&raw).map(Value::Text).unwrap_or(Value::Null)
}
