//! CLI entry point for the WordPress × GA4 report ETL.
//!
//! Provides subcommands for producing the merged analytics table, the
//! top/flop article report, and a cleaned "Pages and screens" export.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use wp_ga4_etl::{
    config::{SchemaKind, TransformConfig},
    extract::{ContentFormat, parse_content, parse_ga4_csv},
    fetch::read_source,
    output::{print_summary, summary_json, write_csv},
    page_screen,
    report::{CategoryMap, run_report, write_report},
    table::Table,
    transform::Transformer,
};

#[derive(Parser)]
#[command(name = "wp_ga4_etl")]
#[command(about = "Joins GA4 page traffic with WordPress content and ranks articles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge, benchmark and bucket a GA4 export against a WordPress export
    Transform {
        /// GA4 "Pages and screens" CSV (file or URL)
        #[arg(long, value_name = "FILE_OR_URL")]
        traffic: String,

        /// WordPress content export (file or URL)
        #[arg(long, value_name = "FILE_OR_URL")]
        content: String,

        /// Format of the WordPress export (xml or csv)
        #[arg(long, default_value = "xml", value_parser = parse_content_format)]
        content_format: ContentFormat,

        /// CSV file to write the result to
        #[arg(short, long, default_value = "output/processed_data_for_report.csv")]
        output: PathBuf,

        /// Optional JSON file overriding the default settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Gzip compress the output file
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Build the top/flop article report
    Report {
        /// GA4 "Pages and screens" CSV (file or URL)
        #[arg(long, value_name = "FILE_OR_URL")]
        traffic: String,

        /// WordPress content export (file or URL)
        #[arg(long, value_name = "FILE_OR_URL")]
        content: String,

        /// Format of the WordPress export (xml or csv)
        #[arg(long, default_value = "xml", value_parser = parse_content_format)]
        content_format: ContentFormat,

        /// Directory for the report files
        #[arg(short = 'd', long, default_value = "output")]
        output_dir: PathBuf,

        /// Prefix prepended to the report file names
        #[arg(short, long, default_value = "")]
        prefix: String,

        /// Keep only the best and worst ten articles
        #[arg(long, default_value_t = false)]
        top_only: bool,

        /// Optional JSON file overriding the default settings
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Keep only article pages of a GA4 "Pages and screens" export
    PageScreen {
        /// GA4 export (file or URL)
        #[arg(short, long, value_name = "FILE_OR_URL")]
        input: String,

        /// CSV file to write the cleaned export to
        #[arg(short, long)]
        output: PathBuf,

        /// Language of the export headers (it or en)
        #[arg(short, long, default_value = "it", value_parser = parse_lang)]
        lang: SchemaKind,
    },
}

fn parse_content_format(code: &str) -> std::result::Result<ContentFormat, String> {
    ContentFormat::from_code(code).ok_or_else(|| format!("unsupported content format '{code}'"))
}

fn parse_lang(code: &str) -> std::result::Result<SchemaKind, String> {
    SchemaKind::from_code(code).ok_or_else(|| format!("unsupported language '{code}'"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/wp_ga4_etl.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("wp_ga4_etl.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let token = std::env::var("EXPORT_API_TOKEN").ok();

    match cli.command {
        Commands::Transform {
            traffic,
            content,
            content_format,
            output,
            config,
            gzip,
        } => {
            let transformer = Transformer::new(load_config(config.as_deref())?)?;
            let (traffic, content) =
                load_exports(&traffic, &content, content_format, token.as_deref()).await?;

            let table = transformer.transform(traffic, content)?;
            print_summary(&table);
            info!(summary = %summary_json(&table)?, "Transformed table");

            write_csv(&output, &table, gzip)
                .with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::Report {
            traffic,
            content,
            content_format,
            output_dir,
            prefix,
            top_only,
            config,
        } => {
            let transformer = Transformer::new(load_config(config.as_deref())?)?;
            let (traffic, content) =
                load_exports(&traffic, &content, content_format, token.as_deref()).await?;

            let table = transformer.transform(traffic, content)?;
            let report = run_report(table, &CategoryMap::default(), top_only)?;
            let paths = write_report(&report, &output_dir, &prefix)
                .with_context(|| format!("writing report to {}", output_dir.display()))?;

            for path in &paths {
                info!(path = %path.display(), "Report file saved");
            }
        }
        Commands::PageScreen {
            input,
            output,
            lang,
        } => {
            let bytes = read_source(&input, token.as_deref())
                .await
                .with_context(|| format!("loading {input}"))?;
            let table = parse_ga4_csv(&bytes)?;

            let cleaned = page_screen::apply(&table, lang)?;
            print_summary(&cleaned);

            write_csv(&output, &cleaned, false)
                .with_context(|| format!("writing {}", output.display()))?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<TransformConfig> {
    match path {
        Some(path) => TransformConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(TransformConfig::default()),
    }
}

/// Loads the GA4 and WordPress exports concurrently.
#[tracing::instrument(skip(token))]
async fn load_exports(
    traffic: &str,
    content: &str,
    content_format: ContentFormat,
    token: Option<&str>,
) -> Result<(Table, Table)> {
    let (traffic_bytes, content_bytes) =
        tokio::try_join!(read_source(traffic, token), read_source(content, token))?;

    let traffic = parse_ga4_csv(&traffic_bytes).with_context(|| format!("parsing {traffic}"))?;
    let content = parse_content(&content_bytes, content_format)
        .with_context(|| format!("parsing {content} as {content_format:?}"))?;
    Ok((traffic, content))
}
