use std::collections::HashMap;
use tracing::{info, warn};

use crate::config::PAGEPATH;
use crate::errors::{EtlError, EtlResult, Stage};
use crate::table::{Column, Table, Value};

/// Left-joins content metadata with traffic metrics on `pagepath`.
///
/// When either side has no usable key the join is skipped: an unusable
/// traffic key returns the content table, an unusable content key returns
/// the traffic table (an empty side yields an empty table). Traffic is
/// checked first.
pub fn merge(traffic: Table, content: Table) -> EtlResult<Table> {
    if let Err(issue) = traffic.lookup_usable(PAGEPATH) {
        warn!(
            stage = %Stage::Merge,
            column = PAGEPATH,
            %issue,
            "Traffic key unusable, returning content data unmerged"
        );
        return Ok(non_empty_or_blank(content));
    }
    if let Err(issue) = content.lookup_usable(PAGEPATH) {
        warn!(
            stage = %Stage::Merge,
            column = PAGEPATH,
            %issue,
            "Content key unusable, returning traffic data unmerged"
        );
        return Ok(non_empty_or_blank(traffic));
    }

    let merged = left_join(&content, &traffic, PAGEPATH)?;
    info!(
        content_rows = content.height(),
        traffic_rows = traffic.height(),
        merged_rows = merged.height(),
        "Merged content with traffic"
    );
    Ok(merged)
}

fn non_empty_or_blank(table: Table) -> Table {
    if table.is_empty() { Table::new() } else { table }
}

/// Many-to-many left join. Left rows keep their order and repeat once per
/// matching right row; null keys never match. Overlapping non-key names get
/// `_x` / `_y` suffixes.
fn left_join(left: &Table, right: &Table, key: &str) -> EtlResult<Table> {
    let left_keys = &left.lookup(key).map_err(|_| missing_key())?.values;
    let right_keys = &right.lookup(key).map_err(|_| missing_key())?.values;

    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, k) in right_keys.iter().enumerate() {
        if let Some(k) = join_key(k) {
            index.entry(k).or_default().push(i);
        }
    }

    let mut left_rows = Vec::with_capacity(left.height());
    let mut right_rows: Vec<Option<usize>> = Vec::with_capacity(left.height());
    for (i, k) in left_keys.iter().enumerate() {
        match join_key(k).and_then(|k| index.get(k)) {
            Some(matches) => {
                for &j in matches {
                    left_rows.push(i);
                    right_rows.push(Some(j));
                }
            }
            None => {
                left_rows.push(i);
                right_rows.push(None);
            }
        }
    }

    let left_names = left.names();
    let right_names = right.names();
    let suffixed = |name: &str, others: &[&str], suffix: &str| {
        if name != key && others.contains(&name) {
            format!("{name}{suffix}")
        } else {
            name.to_string()
        }
    };

    let mut columns = Vec::with_capacity(left.width() + right.width());
    for column in left.columns() {
        let values = left_rows.iter().map(|&i| column.values[i].clone()).collect();
        columns.push(Column::new(suffixed(&column.name, &right_names, "_x"), values));
    }
    for column in right.columns().iter().filter(|c| c.name != key) {
        let values = right_rows
            .iter()
            .map(|j| j.map_or(Value::Null, |j| column.values[j].clone()))
            .collect();
        columns.push(Column::new(suffixed(&column.name, &left_names, "_y"), values));
    }

    Table::from_columns(columns).map_err(|e| e.in_stage(Stage::Merge, Some(key)))
}

fn join_key(value: &Value) -> Option<&str> {
    match value {
        Value::Text(s) => Some(s.as_str()),
        _ => None,
    }
}

fn missing_key() -> EtlError {
    EtlError::stage(Stage::Merge, Some(PAGEPATH), "join key disappeared")
}
