//! Readers for the GA4 CSV export and the WordPress export (WXR or CSV).
//!
//! Cells are loaded as text; typing happens in the cleaning stage.

use csv::ReaderBuilder;
use roxmltree::{Document, Node};
use std::io::Cursor;
use tracing::debug;

use crate::errors::EtlResult;
use crate::table::{Column, Table, Value};

const BOM: &str = "\u{feff}";

const WP_NS_PREFIX: &str = "http://wordpress.org/export/";
const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";
const YOAST_KEYS: [&str; 3] = [
    "_yoast_wpseo_focuskw",
    "_yoast_wpseo_metadesc",
    "_yoast_wpseo_linkdex",
];

/// Layout of the WordPress content export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentFormat {
    /// WordPress eXtended RSS, the native "Tools > Export" file.
    #[default]
    Xml,
    Csv,
}

impl ContentFormat {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "xml" | "wxr" => Some(ContentFormat::Xml),
            "csv" => Some(ContentFormat::Csv),
            _ => None,
        }
    }
}

/// Reads a WordPress export in the given format.
pub fn parse_content(bytes: &[u8], format: ContentFormat) -> EtlResult<Table> {
    match format {
        ContentFormat::Xml => parse_wordpress_xml(bytes),
        ContentFormat::Csv => parse_csv(bytes),
    }
}

/// Reads a GA4 "Pages and screens" export.
///
/// GA4 prefixes the data with a comment preamble (`# ...` lines and blank
/// lines); everything up to the header row is skipped.
pub fn parse_ga4_csv(bytes: &[u8]) -> EtlResult<Table> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix(BOM).unwrap_or(&*text);

    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            offset += line.len();
        } else {
            break;
        }
    }
    debug!(skipped_bytes = offset, "Skipped GA4 preamble");

    parse_csv(&text.as_bytes()[offset..])
}

/// Reads a headed CSV (WordPress CSV export or any plain table).
///
/// Empty cells become nulls; short rows are padded and long rows truncated
/// to the header width.
pub fn parse_csv(bytes: &[u8]) -> EtlResult<Table> {
    let bytes = bytes.strip_prefix(BOM.as_bytes()).unwrap_or(bytes);
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_reader(Cursor::new(bytes));

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut columns: Vec<Column> = headers.iter().map(|h| Column::new(h.clone(), Vec::new())).collect();

    for result in rdr.records() {
        let record = result?;
        for (idx, column) in columns.iter_mut().enumerate() {
            let cell = record.get(idx).map_or(Value::Null, Value::text);
            column.values.push(cell);
        }
    }

    let table = Table::from_columns(columns)?;
    debug!(rows = table.height(), columns = table.width(), "Parsed CSV");
    Ok(table)
}

/// Reads a WordPress WXR export, keeping items whose `wp:post_type` is `post`.
///
/// Produces the columns `title`, `link`, `category`, `pubdate`, the three
/// Yoast SEO meta keys and `content`. Categories are the `<category>`
/// elements with `domain="category"`, joined with `", "`; tags are ignored.
pub fn parse_wordpress_xml(bytes: &[u8]) -> EtlResult<Table> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix(BOM).unwrap_or(&*text);
    let doc = Document::parse(text)?;

    let names = ["title", "link", "category", "pubdate"]
        .into_iter()
        .chain(YOAST_KEYS)
        .chain(["content"]);
    let mut columns: Vec<Column> = names.map(|n| Column::new(n, Vec::new())).collect();

    let items = doc
        .descendants()
        .filter(|n| n.has_tag_name("channel"))
        .flat_map(|channel| channel.children().filter(|n| n.has_tag_name("item")));

    let mut skipped = 0usize;
    for item in items {
        let post_type = wp_child(item, "post_type").and_then(|n| n.text());
        if post_type != Some("post") {
            skipped += 1;
            continue;
        }

        let categories: Vec<&str> = item
            .children()
            .filter(|n| n.has_tag_name("category") && n.attribute("domain") == Some("category"))
            .filter_map(|n| n.text())
            .collect();

        let mut meta: [Option<&str>; 3] = [None; 3];
        for postmeta in item.children().filter(|n| is_wp(n, "postmeta")) {
            let key = wp_child(postmeta, "meta_key").and_then(|n| n.text());
            let value = wp_child(postmeta, "meta_value").and_then(|n| n.text());
            if let (Some(key), Some(value)) = (key, value) {
                if let Some(slot) = YOAST_KEYS.iter().position(|k| *k == key) {
                    meta[slot] = Some(value);
                }
            }
        }

        let row = [
            child_text(item, "title", None),
            child_text(item, "link", None),
            (!categories.is_empty()).then(|| categories.join(", ")),
            child_text(item, "pubDate", None),
            meta[0].map(str::to_string),
            meta[1].map(str::to_string),
            meta[2].map(str::to_string),
            child_text(item, "encoded", Some(CONTENT_NS)),
        ];
        for (column, cell) in columns.iter_mut().zip(row) {
            column.values.push(cell.map_or(Value::Null, Value::text));
        }
    }

    let table = Table::from_columns(columns)?;
    debug!(posts = table.height(), skipped, "Parsed WordPress XML");
    Ok(table)
}

fn is_wp(node: &Node, name: &str) -> bool {
    node.tag_name().name() == name
        && node
            .tag_name()
            .namespace()
            .is_some_and(|ns| ns.starts_with(WP_NS_PREFIX))
}

fn wp_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_wp(n, name))
}

fn child_text(node: Node, name: &str, namespace: Option<&str>) -> Option<String> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == namespace)
        .and_then(|n| n.text())
        .map(str::to_string)
}
