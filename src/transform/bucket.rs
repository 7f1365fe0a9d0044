//! Ordered bucket labels for the benchmark differences.
//!
//! Each diff column is split into `n` labelled buckets, lowest first:
//!
//! | Non-null values                         | Method                        |
//! |-----------------------------------------|-------------------------------|
//! | none                                    | all null                      |
//! | fewer than `n`, or fewer distinct       | equal-width cut               |
//! | otherwise                               | quantile (equal-count) cut    |
//!
//! Any cut that cannot produce exactly one bin per label leaves the bucket
//! column null instead of failing the run.

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::BucketTarget;
use crate::errors::{EtlResult, Stage};
use crate::table::{Column, Table, Value};
use crate::transform::utility::{distinct_count, linspace, quantile_sorted, sorted};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutMethod {
    Quantile,
    EqualWidth,
}

#[derive(Debug, Error, PartialEq)]
pub enum CutError {
    #[error("cannot bin non-finite values")]
    NonFinite,
    #[error("bin edges collapsed to {bins} bins for {labels} labels")]
    LabelMismatch { bins: usize, labels: usize },
    #[error("no values to bin")]
    Empty,
}

/// Picks the cut method for the non-null values of a column.
pub fn choose_method(values: &[f64], n: usize) -> Option<CutMethod> {
    if values.is_empty() {
        None
    } else if values.len() < n || distinct_count(values) < n {
        Some(CutMethod::EqualWidth)
    } else {
        Some(CutMethod::Quantile)
    }
}

/// Quantile bin edges: the linearly interpolated quantiles at `i / n`,
/// with duplicate edges dropped.
pub fn quantile_edges(values: &[f64], n: usize) -> Result<Vec<f64>, CutError> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(CutError::NonFinite);
    }
    let sorted = sorted(values);
    let mut edges: Vec<f64> = (0..=n)
        .map(|i| quantile_sorted(&sorted, i as f64 / n as f64).ok_or(CutError::Empty))
        .collect::<Result<_, _>>()?;
    if edges.len() > 2 {
        edges.dedup();
    }
    Ok(edges)
}

/// Equal-width bin edges over `[min, max]`. The lowest edge is pushed down
/// by 0.1% of the range so the minimum lands in the first bin; a constant
/// column is widened by 0.1% on both sides.
pub fn equal_width_edges(values: &[f64], n: usize) -> Result<Vec<f64>, CutError> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(CutError::NonFinite);
    }
    let min = values.iter().copied().reduce(f64::min).ok_or(CutError::Empty)?;
    let max = values.iter().copied().reduce(f64::max).ok_or(CutError::Empty)?;

    let mut edges = if min == max {
        let pad = |v: f64| if v != 0.0 { 0.001 * v.abs() } else { 0.001 };
        linspace(min - pad(min), max + pad(max), n)
    } else {
        let mut edges = linspace(min, max, n);
        edges[0] -= (max - min) * 0.001;
        edges
    };
    edges.dedup();
    Ok(edges)
}

/// Index of the right-closed bin holding `x`; the lowest edge is inclusive.
fn bin_of(x: f64, edges: &[f64]) -> Option<usize> {
    let first = *edges.first()?;
    if x == first {
        return Some(0);
    }
    let idx = edges.iter().take_while(|&&e| e < x).count();
    if idx == 0 || idx >= edges.len() {
        None
    } else {
        Some(idx - 1)
    }
}

/// Assigns each cell to a label index using `method`. Null cells stay `None`.
pub fn cut(
    values: &[Option<f64>],
    method: CutMethod,
    n: usize,
    labels: usize,
) -> Result<Vec<Option<usize>>, CutError> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let edges = match method {
        CutMethod::Quantile => quantile_edges(&present, n)?,
        CutMethod::EqualWidth => equal_width_edges(&present, n)?,
    };
    if edges.len() != labels + 1 {
        return Err(CutError::LabelMismatch {
            bins: edges.len().saturating_sub(1),
            labels,
        });
    }
    Ok(values.iter().map(|v| v.and_then(|x| bin_of(x, &edges))).collect())
}

/// Adds one bucket column per target, see the module docs for the rules.
pub fn add_quantile_buckets(
    mut table: Table,
    targets: &[BucketTarget],
    n: usize,
    labels: &[String],
) -> EtlResult<Table> {
    for target in targets {
        let Ok(source) = table.lookup(&target.diff) else {
            warn!(
                stage = %Stage::Bucket,
                column = %target.diff,
                "Source column missing, '{}' will be null",
                target.bucket
            );
            table.push_nulls(&target.bucket);
            continue;
        };

        let numbers: Vec<Option<f64>> = source.values.iter().map(Value::as_number).collect();
        let present: Vec<f64> = numbers.iter().flatten().copied().collect();

        let Some(method) = choose_method(&present, n) else {
            table.push_nulls(&target.bucket);
            continue;
        };
        if method == CutMethod::EqualWidth {
            warn!(
                stage = %Stage::Bucket,
                column = %target.diff,
                non_null = present.len(),
                distinct = distinct_count(&present),
                buckets = n,
                "Too few values for quantile buckets, using equal-width bins"
            );
        }

        match cut(&numbers, method, n, labels.len()) {
            Ok(codes) => {
                debug!(column = %target.bucket, ?method, "Bucketed column");
                let cells = codes
                    .into_iter()
                    .map(|code| code.map_or(Value::Null, |c| Value::Text(labels[c].clone())))
                    .collect();
                table
                    .push_column(Column::new(target.bucket.clone(), cells))
                    .map_err(|e| e.in_stage(Stage::Bucket, Some(&target.bucket)))?;
            }
            Err(e) => {
                warn!(
                    stage = %Stage::Bucket,
                    column = %target.diff,
                    error = %e,
                    "Bucketing failed, '{}' will be null",
                    target.bucket
                );
                table.push_nulls(&target.bucket);
            }
        }
    }

    Ok(table)
}
