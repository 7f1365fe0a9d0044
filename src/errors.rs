use std::fmt;
use std::io;

use thiserror::Error;

pub type EtlResult<T> = Result<T, EtlError>;

/// Transformation stage an error or warning originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clean,
    Merge,
    Benchmark,
    Bucket,
    Select,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Clean => "clean",
            Stage::Merge => "merge",
            Stage::Benchmark => "benchmark",
            Stage::Bucket => "bucket",
            Stage::Select => "select",
            Stage::Report => "report",
        };
        f.write_str(name)
    }
}

/// Error type for configuration, extraction, transformation and export failures.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("{stage} stage failed on column '{}': {reason}", column.as_deref().unwrap_or("-"))]
    Stage {
        stage: Stage,
        column: Option<String>,
        reason: String,
    },
    #[error("table shape error: column '{column}' has {actual} rows, expected {expected}")]
    Shape {
        column: String,
        expected: usize,
        actual: usize,
    },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("fetch failed for '{source_ref}': {reason}")]
    Fetch { source_ref: String, reason: String },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("WordPress XML export is malformed: {0}")]
    Xml(#[from] roxmltree::Error),
}

impl EtlError {
    pub fn stage(stage: Stage, column: Option<&str>, reason: impl Into<String>) -> Self {
        EtlError::Stage {
            stage,
            column: column.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// Tags a lower-level error with the stage (and column) it surfaced in.
    pub fn in_stage(self, stage: Stage, column: Option<&str>) -> Self {
        match self {
            EtlError::Stage { .. } => self,
            other => EtlError::stage(stage, column, other.to_string()),
        }
    }
}
