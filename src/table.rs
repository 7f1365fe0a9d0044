//! In-memory tabular data shared by every transformation stage.
//!
//! A [`Table`] is an ordered list of equally tall [`Column`]s holding loosely
//! typed [`Value`]s. Stages take tables by value and hand new ones downstream.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

use crate::errors::{EtlError, EtlResult};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// A single cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Builds a text cell, mapping blank strings to [`Value::Null`].
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            Value::Null
        } else {
            Value::Text(s)
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell. Unparseable text and NaN yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Value::Number(n) => *n,
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if n.is_nan() { None } else { Some(n) }
    }

    /// Datetime view of the cell, see [`parse_datetime`].
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            Value::Text(s) => parse_datetime(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_numeric(&self) -> Value {
        self.as_number().map(Value::Number).unwrap_or(Value::Null)
    }

    pub fn to_datetime(&self) -> Value {
        self.as_datetime().map(Value::DateTime).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Number(n) if n.is_nan() => Ok(()),
            Value::Number(n) => write!(f, "{n}"),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Parses a timestamp into a timezone-naive datetime.
///
/// Zoned inputs (RFC 2822 as found in WordPress `pubDate`, RFC 3339) keep
/// their wall-clock time. Bare dates become midnight.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Why a column could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnIssue {
    Missing,
    AllNull,
}

impl fmt::Display for ColumnIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnIssue::Missing => f.write_str("column not found"),
            ColumnIssue::AllNull => f.write_str("column is entirely null"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// A column of `height` null cells.
    pub fn nulls(name: impl Into<String>, height: usize) -> Self {
        Self::new(name, vec![Value::Null; height])
    }

    pub fn is_all_null(&self) -> bool {
        self.values.iter().all(Value::is_null)
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub fn map(&self, f: impl Fn(&Value) -> Value) -> Column {
        Column::new(self.name.clone(), self.values.iter().map(f).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    height: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> EtlResult<Self> {
        let mut table = Table::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Builds a table from row-major data. Every row must have one cell per name.
    pub fn from_rows(names: &[&str], rows: Vec<Vec<Value>>) -> EtlResult<Self> {
        let mut columns: Vec<Column> = names.iter().map(|n| Column::new(*n, Vec::new())).collect();
        for row in rows {
            if row.len() != names.len() {
                return Err(EtlError::Shape {
                    column: format!("row {}", columns.first().map_or(0, |c| c.values.len())),
                    expected: names.len(),
                    actual: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }
        Self::from_columns(columns)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.columns.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Fallible column access shared by all stages.
    ///
    /// With `require_values` set, a present column whose cells are all null
    /// is reported as [`ColumnIssue::AllNull`].
    pub fn access(&self, name: &str, require_values: bool) -> Result<&Column, ColumnIssue> {
        let column = self.column(name).ok_or(ColumnIssue::Missing)?;
        if require_values && column.is_all_null() {
            return Err(ColumnIssue::AllNull);
        }
        Ok(column)
    }

    /// The column if present.
    pub fn lookup(&self, name: &str) -> Result<&Column, ColumnIssue> {
        self.access(name, false)
    }

    /// The column if present and holding at least one non-null value.
    pub fn lookup_usable(&self, name: &str) -> Result<&Column, ColumnIssue> {
        self.access(name, true)
    }

    /// Appends a column, or replaces the column of the same name in place.
    ///
    /// The first column pushed into a column-less table fixes its height.
    pub fn push_column(&mut self, column: Column) -> EtlResult<()> {
        if self.columns.is_empty() {
            self.height = column.values.len();
        } else if column.values.len() != self.height {
            return Err(EtlError::Shape {
                column: column.name,
                expected: self.height,
                actual: column.values.len(),
            });
        }
        match self.position(&column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Appends (or overwrites) an all-null column.
    pub fn push_nulls(&mut self, name: &str) {
        let column = Column::nulls(name, self.height);
        match self.position(name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.position(name)?;
        let column = self.columns.remove(idx);
        if self.columns.is_empty() {
            self.height = 0;
        }
        Some(column)
    }

    /// Renames `from` to `to`. Returns false when `from` does not exist.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return self.contains(from);
        }
        if !self.contains(from) {
            return false;
        }
        if let Some(existing) = self.position(to) {
            self.columns.remove(existing);
        }
        if let Some(idx) = self.position(from) {
            self.columns[idx].name = to.to_string();
        }
        true
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name).and_then(|c| c.values.get(row))
    }

    /// Cells of row `idx`, in column order.
    pub fn row(&self, idx: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[idx]).collect()
    }

    /// New table holding the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), indices.iter().map(|&i| c.values[i].clone()).collect()))
            .collect();
        Table {
            columns,
            height: if self.columns.is_empty() { 0 } else { indices.len() },
        }
    }

    /// Keeps the rows for which `keep` returns true.
    pub fn filter_rows(&self, keep: impl Fn(usize) -> bool) -> Table {
        let indices: Vec<usize> = (0..self.height).filter(|&i| keep(i)).collect();
        self.take_rows(&indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            &["title", "views"],
            vec![
                vec![Value::text("A"), Value::Number(1.0)],
                vec![Value::text("B"), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_text_blank_is_null() {
        assert_eq!(Value::text("   "), Value::Null);
        assert_eq!(Value::text("x"), Value::Text("x".into()));
    }

    #[test]
    fn test_as_number_coerces_text_and_rejects_garbage() {
        assert_eq!(Value::text(" 12.5 ").as_number(), Some(12.5));
        assert_eq!(Value::text("n/a").as_number(), None);
        assert_eq!(Value::Number(f64::NAN).as_number(), None);
        assert!(Value::Number(f64::NAN).is_null());
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("Sun, 01 Jan 2023 10:00:00 +0000"), Some(expected));
        assert_eq!(parse_datetime("2023-01-01 10:00:00"), Some(expected));
        assert_eq!(parse_datetime("2023-01-01T10:00:00+02:00"), Some(expected));
        assert_eq!(
            parse_datetime("2023-01-01"),
            NaiveDate::from_ymd_opt(2023, 1, 1).map(|d| d.and_time(NaiveTime::MIN))
        );
        assert_eq!(parse_datetime("not a date"), None);
    }

    #[test]
    fn test_from_rows_rejects_ragged_rows() {
        let result = Table::from_rows(&["a", "b"], vec![vec![Value::Null]]);
        assert!(matches!(result, Err(EtlError::Shape { .. })));
    }

    #[test]
    fn test_lookup_reports_missing_and_all_null() {
        let mut table = sample();
        table.push_nulls("empty");

        assert!(table.lookup("title").is_ok());
        assert_eq!(table.lookup("nope").unwrap_err(), ColumnIssue::Missing);
        assert!(table.lookup("empty").is_ok());
        assert_eq!(table.lookup_usable("empty").unwrap_err(), ColumnIssue::AllNull);
    }

    #[test]
    fn test_push_column_checks_height() {
        let mut table = sample();
        let err = table.push_column(Column::new("x", vec![Value::Null])).unwrap_err();
        assert!(matches!(err, EtlError::Shape { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_push_column_replaces_in_place() {
        let mut table = sample();
        table
            .push_column(Column::new("title", vec![Value::text("C"), Value::text("D")]))
            .unwrap();
        assert_eq!(table.names(), vec!["title", "views"]);
        assert_eq!(table.value(0, "title"), Some(&Value::text("C")));
    }

    #[test]
    fn test_rename_overwrites_existing_target() {
        let mut table = sample();
        assert!(table.rename("views", "title"));
        assert_eq!(table.names(), vec!["title"]);
        assert!(!table.rename("missing", "x"));
    }

    #[test]
    fn test_filter_and_take_rows() {
        let table = sample();
        let filtered = table.filter_rows(|i| i == 1);
        assert_eq!(filtered.height(), 1);
        assert_eq!(filtered.value(0, "title"), Some(&Value::text("B")));

        let reordered = table.take_rows(&[1, 0]);
        assert_eq!(reordered.value(0, "title"), Some(&Value::text("B")));
    }

    #[test]
    fn test_is_empty() {
        assert!(Table::new().is_empty());
        assert!(sample().filter_rows(|_| false).is_empty());
        assert!(!sample().is_empty());
    }
}
