//! Load → filter → aggregate over real files on disk.

use std::collections::BTreeSet;
use std::fs;

use langstat_core::models::{Language, PerLanguage, RecordType, RowIssue, Source};
use langstat_data::aggregator::{AggregateViews, Aggregator};
use langstat_data::filter::{self, FilterSelection};
use langstat_data::loader::{FsFetcher, Loader};
use langstat_data::normalizer::ColumnLayout;
use langstat_data::repository::Repository;
use tempfile::TempDir;

const HEADER: &str = "Год,Тип,Всего,Тувинский_ңөү_кол,Тувинский_ңөү_%,Тувинский_рус_клав_кол,Тувинский_рус_клав_%,Русский_кол,Русский_%";

fn write_source(dir: &TempDir, source: Source, rows: &[&str]) {
    let mut text = String::from("\u{feff}");
    text.push_str(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    fs::write(dir.path().join(source.file_name()), text).unwrap();
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_source(
        &dir,
        Source::Community,
        &[
            "2020,Посты,10,5,50.0,3,30.0,2,20.0",
            "2021,Комментарии,8,2,25.0,2,25.0,4,50.0",
        ],
    );
    write_source(
        &dir,
        Source::Government,
        &[
            "2020,Посты,20,10,50.0,5,25.0,5,25.0",
            "2021,Посты,abc,1,10.0,1,10.0,8,80.0",
        ],
    );
    write_source(
        &dir,
        Source::Official,
        &["2019,Комментарии,4,0,0.0,1,25.0,3,75.0"],
    );
    dir
}

async fn load(dir: &TempDir) -> langstat_data::loader::NormalizedSet {
    Loader::new(FsFetcher::new(dir.path()), ColumnLayout::russian())
        .load_all()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_distribution_matches_raw_count_columns() {
    let dir = fixture();
    let set = load(&dir).await;
    let repo = Repository::new(set.records);

    let all = filter::apply(repo.records(), &FilterSelection::default());
    let dist = Aggregator::distribution(&all);

    // Valid rows only: the `abc` total row is rejected.
    assert_eq!(dist.counts, PerLanguage::new(5 + 2 + 10, 3 + 2 + 5 + 1, 2 + 4 + 5 + 3));
}

#[tokio::test]
async fn test_non_numeric_total_is_excluded_and_reported() {
    let dir = fixture();
    let set = load(&dir).await;

    assert_eq!(set.records.len(), 4);
    assert_eq!(set.count_for(Source::Government), 1);

    let rejected: Vec<_> = set.diagnostics.iter().filter(|d| d.is_rejection()).collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].source, Source::Government);
    assert_eq!(rejected[0].row, 1);
    assert_eq!(rejected[0].line, 3);
    assert!(matches!(
        &rejected[0].issue,
        RowIssue::InvalidInteger { value, .. } if value == "abc"
    ));

    let repo = Repository::new(set.records);
    assert!(!repo.records().iter().any(|r| r.year == 2021 && r.source == Source::Government));
}

#[tokio::test]
async fn test_scenario_through_the_pipeline() {
    let dir = fixture();
    let repo = Repository::new(load(&dir).await.records);

    let selection = FilterSelection::new(
        [2020],
        [RecordType::Post],
        [Source::Community, Source::Government],
    );
    let subset = filter::apply(repo.records(), &selection);
    let views = AggregateViews::compute(&subset, &selection.sources);

    assert_eq!(views.percent_series.get(2020).unwrap().tuvan_special, 50.0);
    assert_eq!(views.count_series.get(2020).unwrap().tuvan_special, 15);
    assert_eq!(views.distribution.counts.tuvan_special, 15);
    assert_eq!(views.stacked_series.years, vec![2020]);
    assert_eq!(views.stacked_series.series[0].totals, vec![10]);
    assert_eq!(views.stacked_series.series[1].totals, vec![20]);
}

#[tokio::test]
async fn test_no_restriction_law_over_loaded_data() {
    let dir = fixture();
    let repo = Repository::new(load(&dir).await.records);

    let every_year: BTreeSet<i32> = repo.years().iter().copied().collect();
    let every_type: BTreeSet<RecordType> = repo.types().iter().cloned().collect();
    let every_source = repo.sources().to_vec();

    let empty_years = BTreeSet::new();
    let empty_types = BTreeSet::new();

    for years in [&empty_years, &every_year] {
        for types in [&empty_types, &every_type] {
            for sources in [&[][..], &every_source[..]] {
                let subset = filter::filter_records(repo.records(), years, types, sources);
                assert_eq!(subset.len(), repo.len());
            }
        }
    }
}

#[tokio::test]
async fn test_count_series_sums_equal_summary_for_every_year_filter() {
    let dir = fixture();
    let repo = Repository::new(load(&dir).await.records);

    for year in repo.years() {
        let selection = FilterSelection::new([*year], repo.types().to_vec(), Source::ALL);
        let subset = filter::apply(repo.records(), &selection);
        let summary = Aggregator::summary(&subset);
        let series = Aggregator::count_series(&subset);
        for lang in Language::ALL {
            let sum: u64 = series.iter().map(|(_, v)| v[lang]).sum();
            assert_eq!(sum, summary.counts[lang]);
        }
    }
}

#[tokio::test]
async fn test_reload_with_disjoint_years_replaces_domain() {
    let dir = fixture();
    let mut repo = Repository::new(load(&dir).await.records);
    assert_eq!(repo.years(), &[2019, 2020, 2021]);

    let next = TempDir::new().unwrap();
    for source in Source::ALL {
        write_source(&next, source, &["2023,Посты,1,1,100.0,0,0.0,0,0.0"]);
    }
    repo.replace(load(&next).await.records);

    assert_eq!(repo.years(), &[2023]);
}

#[tokio::test]
async fn test_missing_file_fails_whole_load() {
    let dir = fixture();
    fs::remove_file(dir.path().join(Source::Official.file_name())).unwrap();

    let result = Loader::new(FsFetcher::new(dir.path()), ColumnLayout::russian())
        .load_all()
        .await;
    assert!(result.unwrap_err().is_load_failure());
}
