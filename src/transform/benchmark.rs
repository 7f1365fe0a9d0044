//! Daily median benchmarks.
//!
//! For every configured metric the rows are grouped by the calendar date of
//! their timestamp, the median of each day is computed, and each row receives
//! `diff_with_daily_benchmark_<base> = metric - median(day)`.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::config::MetricSpec;
use crate::errors::{EtlResult, Stage};
use crate::table::{Column, Table, Value};
use crate::transform::utility::median;

/// Median of `metric_column` per calendar day of `timestamp_column`.
///
/// Rows missing either value are ignored. Missing columns give an empty map.
pub fn daily_medians(
    table: &Table,
    timestamp_column: &str,
    metric_column: &str,
) -> BTreeMap<NaiveDate, f64> {
    let (Ok(timestamps), Ok(metrics)) = (table.lookup(timestamp_column), table.lookup(metric_column))
    else {
        return BTreeMap::new();
    };

    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for (ts, metric) in timestamps.values.iter().zip(&metrics.values) {
        if let (Some(ts), Some(metric)) = (ts.as_datetime(), metric.as_number()) {
            by_day.entry(ts.date()).or_default().push(metric);
        }
    }

    by_day
        .into_iter()
        .filter_map(|(day, values)| median(&values).map(|m| (day, m)))
        .collect()
}

/// Adds one diff column per metric. Diff columns are always present: when
/// the timestamp or the metric is unavailable they are filled with nulls.
pub fn add_benchmark_differences(
    mut table: Table,
    timestamp_column: &str,
    metrics: &[MetricSpec],
) -> EtlResult<Table> {
    if let Err(issue) = table.lookup_usable(timestamp_column) {
        warn!(
            stage = %Stage::Benchmark,
            column = timestamp_column,
            %issue,
            "Timestamp unusable, benchmark differences will be null"
        );
        for metric in metrics {
            table.push_nulls(&metric.diff_column());
        }
        return Ok(table);
    }

    let days: Vec<Option<NaiveDate>> = table
        .lookup(timestamp_column)
        .map(|c| c.values.iter().map(|v| v.as_datetime().map(|dt| dt.date())).collect())
        .unwrap_or_default();

    for metric in metrics {
        let diff_column = metric.diff_column();

        let Ok(values) = table.lookup(&metric.source) else {
            warn!(
                stage = %Stage::Benchmark,
                column = %metric.source,
                "Metric column missing, adding null '{}'",
                diff_column
            );
            table.push_nulls(&diff_column);
            continue;
        };

        let medians = daily_medians(&table, timestamp_column, &metric.source);
        if medians.is_empty() {
            warn!(
                stage = %Stage::Benchmark,
                column = %metric.source,
                "No daily medians available, '{}' will be null",
                diff_column
            );
            table.push_nulls(&diff_column);
            continue;
        }
        debug!(column = %metric.source, days = medians.len(), "Computed daily medians");

        let diffs = values
            .values
            .iter()
            .zip(&days)
            .map(|(value, day)| {
                let median = day.and_then(|d| medians.get(&d))?;
                Some(value.as_number()? - median)
            })
            .map(|d| d.map_or(Value::Null, Value::Number))
            .collect();

        table
            .push_column(Column::new(diff_column, diffs))
            .map_err(|e| e.in_stage(Stage::Benchmark, Some(&metric.source)))?;
    }

    Ok(table)
}
