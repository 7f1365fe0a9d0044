//! GA4 traffic × WordPress content transformation.
//!
//! The pipeline cleans both exports, joins them on the normalized page path,
//! adds daily median benchmark differences and quantile buckets for each
//! configured metric, and projects the result onto the configured columns.
//! Every stage takes a table by value and returns a new one.

pub mod benchmark;
pub mod bucket;
pub mod clean;
pub mod merge;
pub mod normalize;
pub mod select;
pub mod utility;

use tracing::{info, warn};

use crate::config::TransformConfig;
use crate::errors::EtlResult;
use crate::table::Table;

pub use benchmark::add_benchmark_differences;
pub use bucket::add_quantile_buckets;
pub use clean::{clean_content, clean_traffic};
pub use merge::merge;
pub use normalize::normalize_url_path;
pub use select::select_columns;

/// Runs the full transformation with a validated configuration.
pub struct Transformer {
    config: TransformConfig,
}

impl Transformer {
    pub fn new(config: TransformConfig) -> EtlResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Turns the raw traffic and content tables into the report table.
    ///
    /// The result always carries the configured columns; it has no rows
    /// when nothing could be merged. Errors name the failing stage.
    #[tracing::instrument(
        skip_all,
        fields(traffic_rows = traffic.height(), content_rows = content.height())
    )]
    pub fn transform(&self, traffic: Table, content: Table) -> EtlResult<Table> {
        let config = &self.config;

        let traffic = clean_traffic(traffic, config)?;
        let content = clean_content(content)?;

        if traffic.is_empty() && content.is_empty() {
            warn!("Traffic and content are both empty after cleaning");
            return select_columns(&Table::new(), &config.columns_to_keep);
        }

        let merged = merge(traffic, content)?;
        if merged.is_empty() {
            warn!("Merge produced no rows, check the join keys");
            return select_columns(&Table::new(), &config.columns_to_keep);
        }

        let with_diffs = add_benchmark_differences(merged, &config.timestamp_column, &config.metrics)?;
        let with_buckets = add_quantile_buckets(
            with_diffs,
            &config.bucket_map,
            config.n_buckets,
            &config.bucket_labels,
        )?;

        let selected = select_columns(&with_buckets, &config.columns_to_keep)?;
        info!(
            rows = selected.height(),
            columns = selected.width(),
            "Transformation complete"
        );
        Ok(selected)
    }
}
