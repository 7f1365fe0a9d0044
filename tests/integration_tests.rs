use wp_ga4_etl::config::{SchemaKind, TransformConfig};
use wp_ga4_etl::extract::{parse_csv, parse_ga4_csv, parse_wordpress_xml};
use wp_ga4_etl::output::write_csv;
use wp_ga4_etl::page_screen;
use wp_ga4_etl::report::{CategoryMap, run_report};
use wp_ga4_etl::table::{Table, Value};
use wp_ga4_etl::transform::Transformer;

fn exports() -> (Table, Table) {
    let traffic = parse_ga4_csv(include_bytes!("fixtures/ga4_pages_it.csv"))
        .expect("Failed to parse GA4 export");
    let content = parse_csv(include_bytes!("fixtures/wp_posts.csv"))
        .expect("Failed to parse WordPress export");
    (traffic, content)
}

fn row_of(table: &Table, title: &str) -> usize {
    (0..table.height())
        .find(|&i| table.value(i, "title") == Some(&Value::text(title)))
        .unwrap_or_else(|| panic!("no row titled {title}"))
}

fn titles(table: &Table) -> Vec<String> {
    (0..table.height())
        .map(|i| table.value(i, "title").unwrap().to_string())
        .collect()
}

#[test]
fn test_full_pipeline() {
    let (traffic, content) = exports();
    let transformer = Transformer::new(TransformConfig::default()).unwrap();

    let table = transformer.transform(traffic, content).unwrap();

    let expected: Vec<&str> = transformer
        .config()
        .columns_to_keep
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(table.names(), expected);
    assert_eq!(table.height(), 6);

    // daily view median is 150
    let b = row_of(&table, "Post B");
    assert_eq!(table.value(b, "views"), Some(&Value::Number(200.0)));
    assert_eq!(
        table.value(b, "diff_with_daily_benchmark_views"),
        Some(&Value::Number(50.0))
    );
    assert_eq!(table.value(b, "views_bucket"), Some(&Value::text("Alto")));

    let c = row_of(&table, "Post C");
    assert_eq!(table.value(c, "pagepath"), Some(&Value::text("/serie-tv/c.html")));
    assert_eq!(table.value(c, "views_bucket"), Some(&Value::text("Molto Basso")));
    assert_eq!(table.value(c, "_yoast_wpseo_linkdex"), Some(&Value::Null));

    let d = row_of(&table, "Post D");
    assert_eq!(
        table.value(d, "average_engagement_time_per_active_user_bucket"),
        Some(&Value::text("Molto Alto"))
    );
    assert_eq!(table.value(d, "_yoast_wpseo_linkdex"), Some(&Value::Number(80.0)));

    let p = row_of(&table, "Draft P");
    assert_eq!(table.value(p, "views"), Some(&Value::Null));
    assert_eq!(table.value(p, "views_bucket"), Some(&Value::Null));
}

#[test]
fn test_xml_content_matches_csv_content() {
    let (traffic, csv_content) = exports();
    let xml_content = parse_wordpress_xml(include_bytes!("fixtures/wp_export.xml"))
        .expect("Failed to parse WordPress XML export");
    assert_eq!(xml_content.height(), 6);

    let transformer = Transformer::new(TransformConfig::default()).unwrap();
    let from_csv = transformer.transform(traffic.clone(), csv_content).unwrap();
    let from_xml = transformer.transform(traffic, xml_content).unwrap();

    assert_eq!(from_xml, from_csv);
}

#[test]
fn test_report_from_exports() {
    let (traffic, content) = exports();
    let transformer = Transformer::new(TransformConfig::default()).unwrap();
    let table = transformer.transform(traffic, content).unwrap();

    let report = run_report(table, &CategoryMap::default(), false).unwrap();

    assert_eq!(report.all.height(), 5);
    assert_eq!(titles(&report.top), vec!["Post B", "Post D"]);
    assert_eq!(titles(&report.flop), vec!["Post A", "Post C"]);

    let d = row_of(&report.all, "Post D");
    assert_eq!(
        report.all.value(d, "category"),
        Some(&Value::text("In Sala"))
    );
}

#[test]
fn test_top_only_report_is_ranked() {
    let (traffic, content) = exports();
    let transformer = Transformer::new(TransformConfig::default()).unwrap();
    let table = transformer.transform(traffic, content).unwrap();

    let report = run_report(table, &CategoryMap::default(), true).unwrap();

    assert_eq!(titles(&report.top), vec!["Post D", "Post B"]);
    assert_eq!(titles(&report.flop), vec!["Post C", "Post A"]);
}

#[test]
fn test_page_screen_cleanup() {
    let (traffic, _) = exports();
    let cleaned = page_screen::apply(&traffic, SchemaKind::Italian).unwrap();

    assert_eq!(cleaned.height(), 5);
    assert_eq!(cleaned.names(), traffic.names());
}

#[test]
fn test_written_csv_reads_back() {
    let (traffic, content) = exports();
    let transformer = Transformer::new(TransformConfig::default()).unwrap();
    let table = transformer.transform(traffic, content).unwrap();

    let path = std::env::temp_dir().join("wp_ga4_etl_integration.csv");
    let _ = std::fs::remove_file(&path);
    write_csv(&path, &table, false).unwrap();

    let reread = parse_csv(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(reread.names(), table.names());
    assert_eq!(reread.height(), table.height());
    let b = row_of(&reread, "Post B");
    assert_eq!(
        reread.value(b, "pubdate"),
        Some(&Value::text("2025-05-10 09:30:00"))
    );

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_custom_config_limits_columns() {
    let config = TransformConfig::from_json(
        r#"{ "metrics": [{ "source": "views", "base": "views" }],
             "n_buckets": 2,
             "bucket_labels": ["low", "high"],
             "columns_to_keep": ["title", "views_bucket"] }"#,
    )
    .unwrap();
    let (traffic, content) = exports();

    let table = Transformer::new(config)
        .unwrap()
        .transform(traffic, content)
        .unwrap();

    assert_eq!(table.names(), vec!["title", "views_bucket"]);
    let d = row_of(&table, "Post D");
    assert_eq!(table.value(d, "views_bucket"), Some(&Value::text("high")));
    let c = row_of(&table, "Post C");
    assert_eq!(table.value(c, "views_bucket"), Some(&Value::text("low")));
}
