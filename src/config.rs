//! Transformation settings.
//!
//! [`TransformConfig`] is built once and handed to the pipeline by reference;
//! nothing reads global tables. The default mirrors the production report.
//! A JSON file may override any subset of fields:
//! ```json
//! {
//!   "schema": "english",
//!   "n_buckets": 5,
//!   "metrics": [{ "source": "views", "base": "views" }],
//!   "columns_to_keep": ["title", "views", "views_bucket"]
//! }
//! ```

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::errors::{EtlError, EtlResult};

pub const DEFAULT_BUCKET_LABELS: [&str; 5] = ["Molto Basso", "Basso", "Medio", "Alto", "Molto Alto"];
pub const DEFAULT_N_BUCKETS: usize = 5;

pub const PAGEPATH: &str = "pagepath";
pub const LINK: &str = "link";
pub const PUBDATE: &str = "pubdate";
pub const LINKDEX: &str = "_yoast_wpseo_linkdex";

const DIFF_PREFIX: &str = "diff_with_daily_benchmark_";

/// Language of a GA4 "Pages and screens" export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    #[default]
    #[serde(alias = "it")]
    Italian,
    #[serde(alias = "en")]
    English,
}

impl SchemaKind {
    /// Name of the page-path column in the raw export.
    pub fn path_column(self) -> &'static str {
        match self {
            SchemaKind::Italian => "Percorso pagina e classe schermata",
            SchemaKind::English => "Page path and screen class",
        }
    }

    /// Headers a bare "Pages and screens" export may carry its path under,
    /// in lookup order. English API exports name it `pagePath`.
    pub fn path_column_aliases(self) -> &'static [&'static str] {
        match self {
            SchemaKind::Italian => &["Percorso pagina e classe schermata"],
            SchemaKind::English => &["Page path and screen class", "pagePath"],
        }
    }

    /// Raw export header → canonical column name.
    pub fn traffic_renames(self) -> Vec<(String, String)> {
        let pairs: [(&str, &str); 5] = match self {
            SchemaKind::Italian => [
                ("Visualizzazioni", "views"),
                ("Utenti attivi", "active users"),
                ("Visualizzazioni per utente attivo", "views per active user"),
                (
                    "Durata media del coinvolgimento per utente attivo",
                    "average engagement time per active user",
                ),
                ("Conteggio eventi", "event count"),
            ],
            SchemaKind::English => [
                ("Views", "views"),
                ("Active users", "active users"),
                ("Views per active user", "views per active user"),
                (
                    "Average engagement time per active user",
                    "average engagement time per active user",
                ),
                ("Event count", "event count"),
            ],
        };
        std::iter::once((self.path_column(), PAGEPATH))
            .chain(pairs)
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect()
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "it" | "italian" => Some(SchemaKind::Italian),
            "en" | "english" => Some(SchemaKind::English),
            _ => None,
        }
    }
}

/// A metric to benchmark: source column and the base name of derived columns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetricSpec {
    pub source: String,
    pub base: String,
}

impl MetricSpec {
    pub fn new(source: &str, base: &str) -> Self {
        Self {
            source: source.to_string(),
            base: base.to_string(),
        }
    }

    pub fn diff_column(&self) -> String {
        format!("{DIFF_PREFIX}{}", self.base)
    }

    pub fn bucket_column(&self) -> String {
        format!("{}_bucket", self.base)
    }
}

/// A diff column and the bucket column derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BucketTarget {
    pub diff: String,
    pub bucket: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformConfig {
    pub schema: SchemaKind,
    pub traffic_renames: Vec<(String, String)>,
    pub metrics: Vec<MetricSpec>,
    pub timestamp_column: String,
    pub n_buckets: usize,
    pub bucket_labels: Vec<String>,
    pub bucket_map: Vec<BucketTarget>,
    pub columns_to_keep: Vec<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self::for_schema(SchemaKind::default())
    }
}

impl TransformConfig {
    pub fn for_schema(schema: SchemaKind) -> Self {
        let metrics = default_metrics();
        let bucket_map = derive_bucket_map(&metrics);
        Self {
            schema,
            traffic_renames: schema.traffic_renames(),
            metrics,
            timestamp_column: PUBDATE.to_string(),
            n_buckets: DEFAULT_N_BUCKETS,
            bucket_labels: DEFAULT_BUCKET_LABELS.iter().map(|s| s.to_string()).collect(),
            bucket_map,
            columns_to_keep: default_columns_to_keep(),
        }
    }

    /// Loads overrides from a JSON file at `path` on top of the defaults.
    pub fn load(path: impl AsRef<Path>) -> EtlResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> EtlResult<Self> {
        let file: ConfigFile = serde_json::from_str(content)?;
        let config = file.into_config();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EtlResult<()> {
        if self.n_buckets == 0 {
            return Err(EtlError::Config("n_buckets must be at least 1".into()));
        }
        if self.bucket_labels.len() != self.n_buckets {
            return Err(EtlError::Config(format!(
                "{} bucket labels given for {} buckets",
                self.bucket_labels.len(),
                self.n_buckets
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.columns_to_keep.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(EtlError::Config(format!(
                "column '{dup}' listed more than once in columns_to_keep"
            )));
        }
        Ok(())
    }

    /// Every numeric column the traffic cleaner coerces.
    pub fn traffic_numeric_columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = self.metrics.iter().map(|m| m.source.clone()).collect();
        for extra in ["views per active user", "event count"] {
            if !cols.iter().any(|c| c == extra) {
                cols.push(extra.to_string());
            }
        }
        cols
    }
}

fn default_metrics() -> Vec<MetricSpec> {
    vec![
        MetricSpec::new("views", "views"),
        MetricSpec::new("active users", "active_users"),
        MetricSpec::new(
            "average engagement time per active user",
            "average_engagement_time_per_active_user",
        ),
    ]
}

fn derive_bucket_map(metrics: &[MetricSpec]) -> Vec<BucketTarget> {
    metrics
        .iter()
        .map(|m| BucketTarget {
            diff: m.diff_column(),
            bucket: m.bucket_column(),
        })
        .collect()
}

fn default_columns_to_keep() -> Vec<String> {
    [
        "title",
        "link",
        "category",
        "pagepath",
        "pubdate",
        "views",
        "active users",
        "views per active user",
        "average engagement time per active user",
        "_yoast_wpseo_focuskw",
        "_yoast_wpseo_metadesc",
        "_yoast_wpseo_linkdex",
        "diff_with_daily_benchmark_views",
        "diff_with_daily_benchmark_active_users",
        "diff_with_daily_benchmark_average_engagement_time_per_active_user",
        "views_bucket",
        "active_users_bucket",
        "average_engagement_time_per_active_user_bucket",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// On-disk shape of the configuration; absent fields fall back to defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    schema: Option<SchemaKind>,
    traffic_renames: Option<BTreeMap<String, String>>,
    metrics: Option<Vec<MetricSpec>>,
    timestamp_column: Option<String>,
    n_buckets: Option<usize>,
    bucket_labels: Option<Vec<String>>,
    bucket_map: Option<Vec<BucketTarget>>,
    columns_to_keep: Option<Vec<String>>,
}

impl ConfigFile {
    fn into_config(self) -> TransformConfig {
        let mut config = TransformConfig::for_schema(self.schema.unwrap_or_default());
        if let Some(renames) = self.traffic_renames {
            config.traffic_renames = renames.into_iter().collect();
        }
        if let Some(metrics) = self.metrics {
            config.bucket_map = derive_bucket_map(&metrics);
            config.metrics = metrics;
        }
        if let Some(bucket_map) = self.bucket_map {
            config.bucket_map = bucket_map;
        }
        if let Some(col) = self.timestamp_column {
            config.timestamp_column = col;
        }
        if let Some(n) = self.n_buckets {
            config.n_buckets = n;
        }
        if let Some(labels) = self.bucket_labels {
            config.bucket_labels = labels;
        }
        if let Some(cols) = self.columns_to_keep {
            config.columns_to_keep = cols;
        }
        config
    }
}
