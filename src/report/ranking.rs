use std::cmp::Ordering;

use tracing::{info, warn};

use crate::config::DEFAULT_BUCKET_LABELS;
use crate::table::{Table, Value};

pub const ENGAGEMENT_BUCKET: &str = "average_engagement_time_per_active_user_bucket";
pub const VIEWS_DIFF: &str = "diff_with_daily_benchmark_views";
pub const RAW_VIEWS: &str = "views";

/// Upper bound on fallback rankings and on `top_only` selections.
pub const TOP_N: usize = 10;

const TOP_BUCKETS: [&str; 2] = ["Alto", "Molto Alto"];
const FLOP_BUCKETS: [&str; 2] = ["Basso", "Molto Basso"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Ascending,
    Descending,
}

/// Best and worst performing articles.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    pub top: Table,
    pub flop: Table,
}

/// Ranks articles by engagement bucket and views benchmark difference.
///
/// With `top_only` the top (flop) set holds the ten best (worst) rows of
/// the `Alto`/`Molto Alto` (`Basso`/`Molto Basso`) buckets, sorted by bucket
/// then views diff. Without it the whole bucket selection is returned in
/// input order, unsorted. An empty selection always falls back to the ten
/// best (worst) rows by views diff.
///
/// Without the bucket or diff column the ranking falls back to raw views,
/// and `table` loses rows whose views are not numeric.
pub fn rank(table: &mut Table, top_only: bool) -> Option<Ranking> {
    if table.contains(ENGAGEMENT_BUCKET) && table.contains(VIEWS_DIFF) {
        return Some(rank_by_engagement(table, top_only));
    }

    warn!(
        required = ?[ENGAGEMENT_BUCKET, VIEWS_DIFF],
        fallback = RAW_VIEWS,
        "Ranking columns missing, falling back to raw views"
    );
    let Some(views) = table.column(RAW_VIEWS) else {
        warn!(column = RAW_VIEWS, "Fallback column missing, cannot rank");
        return None;
    };

    let numeric: Vec<Option<f64>> = views.values.iter().map(Value::as_number).collect();
    *table = table.filter_rows(|i| numeric[i].is_some());
    let views: Vec<Option<f64>> = numeric.into_iter().flatten().map(Some).collect();

    let all: Vec<usize> = (0..table.height()).collect();
    Some(Ranking {
        top: table.take_rows(&head(sort_by_key(&all, &views, Direction::Descending), TOP_N)),
        flop: table.take_rows(&head(sort_by_key(&all, &views, Direction::Ascending), TOP_N)),
    })
}

fn rank_by_engagement(table: &Table, top_only: bool) -> Ranking {
    let diffs: Vec<Option<f64>> = table
        .column(VIEWS_DIFF)
        .map(|c| c.values.iter().map(Value::as_number).collect())
        .unwrap_or_default();
    let buckets: Vec<Option<usize>> = table
        .column(ENGAGEMENT_BUCKET)
        .map(|c| c.values.iter().map(bucket_rank).collect())
        .unwrap_or_default();

    let top = select(table, &buckets, &diffs, &TOP_BUCKETS, Direction::Descending, top_only);
    let flop = select(table, &buckets, &diffs, &FLOP_BUCKETS, Direction::Ascending, top_only);
    Ranking { top, flop }
}

fn select(
    table: &Table,
    buckets: &[Option<usize>],
    diffs: &[Option<f64>],
    wanted: &[&str],
    direction: Direction,
    top_only: bool,
) -> Table {
    let wanted: Vec<usize> = wanted.iter().filter_map(|w| label_rank(w)).collect();
    let chosen: Vec<usize> = (0..table.height())
        .filter(|&i| buckets[i].is_some_and(|b| wanted.contains(&b)))
        .collect();

    if chosen.is_empty() {
        info!(?direction, "No rows in the wanted buckets, ranking globally by views diff");
        let all: Vec<usize> = (0..table.height()).collect();
        return table.take_rows(&head(sort_by_key(&all, diffs, direction), TOP_N));
    }

    if !top_only {
        info!(rows = chosen.len(), ?direction, "Keeping all rows in the wanted buckets");
        return table.take_rows(&chosen);
    }

    info!(rows = chosen.len(), ?direction, "Ranking rows by bucket then views diff");
    let mut ordered = chosen;
    ordered.sort_by(|&a, &b| {
        let by_bucket = buckets[a].cmp(&buckets[b]);
        let by_bucket = match direction {
            Direction::Ascending => by_bucket,
            Direction::Descending => by_bucket.reverse(),
        };
        by_bucket.then_with(|| compare_nulls_last(diffs[a], diffs[b], direction))
    });

    ordered.truncate(TOP_N);
    table.take_rows(&ordered)
}

fn bucket_rank(value: &Value) -> Option<usize> {
    value.as_str().and_then(label_rank)
}

fn label_rank(label: &str) -> Option<usize> {
    DEFAULT_BUCKET_LABELS.iter().position(|l| *l == label)
}

fn sort_by_key(indices: &[usize], key: &[Option<f64>], direction: Direction) -> Vec<usize> {
    let mut sorted = indices.to_vec();
    sorted.sort_by(|&a, &b| compare_nulls_last(key[a], key[b], direction));
    sorted
}

/// Orders by `direction`, always placing missing values after present ones.
fn compare_nulls_last(a: Option<f64>, b: Option<f64>, direction: Direction) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.total_cmp(&y);
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn head(mut indices: Vec<usize>, n: usize) -> Vec<usize> {
    indices.truncate(n);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked_table() -> Table {
        Table::from_rows(
            &["title", ENGAGEMENT_BUCKET, VIEWS_DIFF],
            vec![
                vec![Value::text("a"), Value::text("Alto"), Value::Number(5.0)],
                vec![Value::text("b"), Value::text("Molto Alto"), Value::Number(-3.0)],
                vec![Value::text("c"), Value::text("Alto"), Value::Number(20.0)],
                vec![Value::text("d"), Value::text("Basso"), Value::Number(-1.0)],
                vec![Value::text("e"), Value::text("Molto Basso"), Value::Number(7.0)],
                vec![Value::text("f"), Value::text("Medio"), Value::Number(100.0)],
                vec![Value::text("g"), Value::text("Basso"), Value::Null],
                vec![Value::text("h"), Value::text("Basso"), Value::Number(-9.0)],
            ],
        )
        .unwrap()
    }

    fn titles(table: &Table) -> Vec<String> {
        (0..table.height())
            .map(|i| table.value(i, "title").unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_top_sorted_by_bucket_then_diff_desc() {
        let mut table = ranked_table();
        let ranking = rank(&mut table, true).unwrap();
        assert_eq!(titles(&ranking.top), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_flop_sorted_by_bucket_then_diff_asc_nulls_last() {
        let mut table = ranked_table();
        let ranking = rank(&mut table, true).unwrap();
        assert_eq!(titles(&ranking.flop), vec!["e", "h", "d", "g"]);
    }

    #[test]
    fn test_full_selection_keeps_input_order() {
        let mut table = ranked_table();
        let ranking = rank(&mut table, false).unwrap();
        assert_eq!(titles(&ranking.top), vec!["a", "b", "c"]);
        assert_eq!(titles(&ranking.flop), vec!["d", "e", "g", "h"]);
    }

    #[test]
    fn test_top_only_truncates() {
        let rows: Vec<Vec<Value>> = (0..15)
            .map(|i| {
                vec![
                    Value::text(format!("t{i}")),
                    Value::text("Alto"),
                    Value::Number(i as f64),
                ]
            })
            .collect();
        let mut table = Table::from_rows(&["title", ENGAGEMENT_BUCKET, VIEWS_DIFF], rows).unwrap();

        let limited = rank(&mut table, true).unwrap();
        assert_eq!(limited.top.height(), TOP_N);
        assert_eq!(limited.top.value(0, "title"), Some(&Value::text("t14")));

        let full = rank(&mut table, false).unwrap();
        assert_eq!(full.top.height(), 15);
        assert_eq!(full.top.value(0, "title"), Some(&Value::text("t0")));
    }

    #[test]
    fn test_empty_bucket_selection_falls_back_to_global_sort() {
        let mut table = Table::from_rows(
            &["title", ENGAGEMENT_BUCKET, VIEWS_DIFF],
            vec![
                vec![Value::text("a"), Value::text("Medio"), Value::Number(1.0)],
                vec![Value::text("b"), Value::text("Medio"), Value::Number(3.0)],
                vec![Value::text("c"), Value::Null, Value::Number(2.0)],
            ],
        )
        .unwrap();

        let ranking = rank(&mut table, false).unwrap();
        assert_eq!(titles(&ranking.top), vec!["b", "c", "a"]);
        assert_eq!(titles(&ranking.flop), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_missing_columns_rank_by_raw_views() {
        let mut table = Table::from_rows(
            &["title", "views"],
            vec![
                vec![Value::text("a"), Value::Number(10.0)],
                vec![Value::text("b"), Value::Null],
                vec![Value::text("c"), Value::Number(30.0)],
            ],
        )
        .unwrap();

        let ranking = rank(&mut table, false).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(titles(&ranking.top), vec!["c", "a"]);
        assert_eq!(titles(&ranking.flop), vec!["a", "c"]);
    }

    #[test]
    fn test_no_rankable_columns() {
        let mut table = Table::from_rows(&["title"], vec![vec![Value::text("a")]]).unwrap();
        assert!(rank(&mut table, false).is_none());
    }
}
