//! Cleanup of a bare GA4 "Pages and screens" export.
//!
//! Keeps article pages only: paths ending in `.html`, never the homepage.

use tracing::{info, warn};

use crate::config::SchemaKind;
use crate::errors::{EtlError, EtlResult, Stage};
use crate::table::{Column, Table};

const HOMEPAGE: &str = "/";

/// First of the schema's path headers present in `table`.
fn path_column(table: &Table, kind: SchemaKind) -> EtlResult<&Column> {
    let aliases = kind.path_column_aliases();
    let name = aliases
        .iter()
        .copied()
        .find(|name| table.contains(name))
        .unwrap_or(kind.path_column());
    table
        .lookup(name)
        .map_err(|issue| EtlError::stage(Stage::Clean, Some(name), issue.to_string()))
}

/// Drops rows whose path does not end with `.html`. Null paths are dropped.
pub fn drop_non_html(table: &Table, kind: SchemaKind) -> EtlResult<Table> {
    let paths = path_column(table, kind)?;
    let kept = table.filter_rows(|i| {
        paths.values[i]
            .as_str()
            .is_some_and(|p| p.ends_with(".html"))
    });

    info!(
        dropped = table.height() - kept.height(),
        "Dropped rows not ending with .html"
    );
    if kept.height() == 0 {
        warn!("No rows left after dropping non-HTML paths");
    }
    Ok(kept)
}

/// Drops rows whose path is exactly `/`.
pub fn remove_homepage(table: &Table, kind: SchemaKind) -> EtlResult<Table> {
    let paths = path_column(table, kind)?;
    let kept = table.filter_rows(|i| paths.values[i].as_str() != Some(HOMEPAGE));
    info!(dropped = table.height() - kept.height(), "Dropped homepage rows");
    Ok(kept)
}

pub fn apply(table: &Table, kind: SchemaKind) -> EtlResult<Table> {
    let html = drop_non_html(table, kind)?;
    remove_homepage(&html, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn pages(kind: SchemaKind) -> Table {
        Table::from_rows(
            &[kind.path_column(), "Views"],
            vec![
                vec![Value::text("/"), Value::text("900")],
                vec![Value::text("/news/story.html"), Value::text("10")],
                vec![Value::text("/category/news/"), Value::text("30")],
                vec![Value::Null, Value::text("1")],
                vec![Value::text("/review/film.html"), Value::text("20")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_drop_non_html() {
        let kept = drop_non_html(&pages(SchemaKind::Italian), SchemaKind::Italian).unwrap();
        assert_eq!(kept.height(), 2);
    }

    #[test]
    fn test_remove_homepage() {
        let kept = remove_homepage(&pages(SchemaKind::English), SchemaKind::English).unwrap();
        assert_eq!(kept.height(), 4);
        assert_eq!(
            kept.value(0, SchemaKind::English.path_column()),
            Some(&Value::text("/news/story.html"))
        );
    }

    #[test]
    fn test_apply_keeps_article_pages() {
        let kind = SchemaKind::Italian;
        let kept = apply(&pages(kind), kind).unwrap();
        assert_eq!(kept.height(), 2);
        assert_eq!(kept.value(1, "Views"), Some(&Value::text("20")));
    }

    #[test]
    fn test_english_page_path_header_is_accepted() {
        let table = Table::from_rows(
            &["pagePath", "screenPageViews"],
            vec![
                vec![Value::text("/"), Value::text("900")],
                vec![Value::text("/news/story.html"), Value::text("10")],
                vec![Value::text("/category/news/"), Value::text("30")],
            ],
        )
        .unwrap();

        let kept = apply(&table, SchemaKind::English).unwrap();
        assert_eq!(kept.height(), 1);
        assert_eq!(kept.value(0, "pagePath"), Some(&Value::text("/news/story.html")));
    }

    #[test]
    fn test_wrong_language_is_clean_stage_error() {
        let result = apply(&pages(SchemaKind::Italian), SchemaKind::English);
        assert!(matches!(
            result,
            Err(EtlError::Stage {
                stage: Stage::Clean,
                ..
            })
        ));
    }
}
