//! Aggregate views over a filtered record subset.
//!
//! Every view is a pure function of the subset it is given. Year-keyed views
//! use a `BTreeMap<i32, _>` so iteration is in numeric year order (`999`
//! before `2020` before `10000`), never in text order.

use std::collections::{BTreeMap, BTreeSet};

use langstat_core::models::{Language, PerLanguage, Record, Source};
use serde::Serialize;

// ── Summary ───────────────────────────────────────────────────────────────────

/// Scalar summary of a subset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Number of records in the subset.
    pub records: usize,
    /// Sum of `total`.
    pub total: u64,
    /// Per-language sum of `count`.
    pub counts: PerLanguage<u64>,
    /// Per-language arithmetic mean of `percent`; `0` for an empty subset.
    pub mean_percent: PerLanguage<f64>,
}

/// Running per-language percent sums, used for means.
#[derive(Debug, Clone, Default)]
struct PercentAccumulator {
    sums: PerLanguage<f64>,
    n: usize,
}

impl PercentAccumulator {
    fn add_record(&mut self, record: &Record) {
        for lang in Language::ALL {
            self.sums[lang] += record.metrics[lang].percent;
        }
        self.n += 1;
    }

    fn means(&self) -> PerLanguage<f64> {
        self.sums.map(|sum| mean(*sum, self.n))
    }
}

fn mean(sum: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Integer sums clamp at `u64::MAX` instead of wrapping.
fn saturating_sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

fn add_counts(acc: &mut PerLanguage<u64>, record: &Record) {
    for lang in Language::ALL {
        acc[lang] = acc[lang].saturating_add(record.metrics[lang].count);
    }
}

// ── TimeSeries ────────────────────────────────────────────────────────────────

/// Per-language values keyed by numeric year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TimeSeries<T> {
    points: BTreeMap<i32, PerLanguage<T>>,
}

impl<T> Default for TimeSeries<T> {
    fn default() -> Self {
        Self {
            points: BTreeMap::new(),
        }
    }
}

impl<T> TimeSeries<T> {
    /// Years present, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.points.keys().copied().collect()
    }

    pub fn get(&self, year: i32) -> Option<&PerLanguage<T>> {
        self.points.get(&year)
    }

    /// `(year, values)` in ascending year order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &PerLanguage<T>)> {
        self.points.iter().map(|(year, values)| (*year, values))
    }

    /// One language's values across the year axis.
    pub fn column(&self, lang: Language) -> Vec<&T> {
        self.points.values().map(|values| &values[lang]).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// ── StackedSeries ─────────────────────────────────────────────────────────────

/// Totals of one source across the shared year axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSeries {
    pub source: Source,
    /// One entry per year of [`StackedSeries::years`]; `0` where the source
    /// has no records that year.
    pub totals: Vec<u64>,
}

/// Sum of `total` per `(year, source)`, one series per requested source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StackedSeries {
    pub years: Vec<i32>,
    pub series: Vec<SourceSeries>,
}

impl StackedSeries {
    /// Value at `(year, source)`, `None` when either is not on the axes.
    pub fn value(&self, year: i32, source: Source) -> Option<u64> {
        let idx = self.years.iter().position(|y| *y == year)?;
        self.series
            .iter()
            .find(|s| s.source == source)
            .map(|s| s.totals[idx])
    }

    /// Column sums: the height of each stacked bar.
    pub fn year_totals(&self) -> Vec<u64> {
        (0..self.years.len())
            .map(|i| saturating_sum(self.series.iter().map(|s| s.totals[i])))
            .collect()
    }
}

// ── Distribution ──────────────────────────────────────────────────────────────

/// Per-language count totals across a whole subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Distribution {
    pub counts: PerLanguage<u64>,
}

impl Distribution {
    /// Sum of all three languages.
    pub fn total(&self) -> u64 {
        saturating_sum(self.counts.iter().map(|(_, c)| *c))
    }

    /// Each language's share of the total, in percent; all zero when empty.
    pub fn shares(&self) -> PerLanguage<f64> {
        let total = self.total();
        self.counts.map(|count| {
            if total == 0 {
                0.0
            } else {
                *count as f64 / total as f64 * 100.0
            }
        })
    }
}

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Stateless helper computing the five views.
pub struct Aggregator;

impl Aggregator {
    pub fn summary(records: &[&Record]) -> Summary {
        let mut summary = Summary::default();
        let mut percents = PercentAccumulator::default();

        for record in records {
            summary.records += 1;
            summary.total = summary.total.saturating_add(record.total);
            add_counts(&mut summary.counts, record);
            percents.add_record(record);
        }

        summary.mean_percent = percents.means();
        summary
    }

    /// Per-year mean of each language's `percent`.
    pub fn percent_series(records: &[&Record]) -> TimeSeries<f64> {
        let mut by_year: BTreeMap<i32, PercentAccumulator> = BTreeMap::new();
        for record in records {
            by_year.entry(record.year).or_default().add_record(record);
        }

        TimeSeries {
            points: by_year
                .into_iter()
                .map(|(year, acc)| (year, acc.means()))
                .collect(),
        }
    }

    /// Per-year sum of each language's `count`.
    pub fn count_series(records: &[&Record]) -> TimeSeries<u64> {
        let mut points: BTreeMap<i32, PerLanguage<u64>> = BTreeMap::new();
        for record in records {
            add_counts(points.entry(record.year).or_default(), record);
        }
        TimeSeries { points }
    }

    /// Sum of `total` per `(year, source)`.
    ///
    /// The year axis is every year in `records`; one series is produced for
    /// each entry of `sources`, in that order.
    pub fn stacked_series(records: &[&Record], sources: &[Source]) -> StackedSeries {
        let mut totals: BTreeMap<(i32, Source), u64> = BTreeMap::new();
        let mut years: BTreeSet<i32> = BTreeSet::new();

        for record in records {
            let slot = totals.entry((record.year, record.source)).or_insert(0);
            *slot = slot.saturating_add(record.total);
            years.insert(record.year);
        }

        let years: Vec<i32> = years.into_iter().collect();
        let series = sources
            .iter()
            .map(|&source| SourceSeries {
                source,
                totals: years
                    .iter()
                    .map(|&year| totals.get(&(year, source)).copied().unwrap_or(0))
                    .collect(),
            })
            .collect();

        StackedSeries { years, series }
    }

    pub fn distribution(records: &[&Record]) -> Distribution {
        let mut counts = PerLanguage::default();
        for record in records {
            add_counts(&mut counts, record);
        }
        Distribution { counts }
    }
}

/// All five views of one subset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateViews {
    pub summary: Summary,
    pub percent_series: TimeSeries<f64>,
    pub count_series: TimeSeries<u64>,
    pub stacked_series: StackedSeries,
    pub distribution: Distribution,
}

impl AggregateViews {
    pub fn compute(records: &[&Record], sources: &[Source]) -> Self {
        Self {
            summary: Aggregator::summary(records),
            percent_series: Aggregator::percent_series(records),
            count_series: Aggregator::count_series(records),
            stacked_series: Aggregator::stacked_series(records, sources),
            distribution: Aggregator::distribution(records),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use langstat_core::models::{LanguageMetric, RecordType};

    fn make_record(
        year: i32,
        total: u64,
        metrics: [(u64, f64); 3],
        source: Source,
    ) -> Record {
        let [a, b, c] = metrics;
        Record {
            year,
            record_type: RecordType::Post,
            total,
            metrics: PerLanguage::new(
                LanguageMetric::new(a.0, a.1),
                LanguageMetric::new(b.0, b.1),
                LanguageMetric::new(c.0, c.1),
            ),
            source,
        }
    }

    fn scenario() -> Vec<Record> {
        vec![
            make_record(2020, 10, [(5, 50.0), (3, 30.0), (2, 20.0)], Source::Community),
            make_record(2020, 20, [(10, 50.0), (5, 25.0), (5, 25.0)], Source::Government),
        ]
    }

    fn refs(records: &[Record]) -> Vec<&Record> {
        records.iter().collect()
    }

    // ── summary ───────────────────────────────────────────────────────────────

    #[test]
    fn test_summary_sums_and_means() {
        let records = scenario();
        let summary = Aggregator::summary(&refs(&records));

        assert_eq!(summary.records, 2);
        assert_eq!(summary.total, 30);
        assert_eq!(summary.counts, PerLanguage::new(15, 8, 7));
        assert_eq!(summary.mean_percent.tuvan_special, 50.0);
        assert!((summary.mean_percent.tuvan_latin - 27.5).abs() < 1e-9);
        assert!((summary.mean_percent.russian - 22.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_empty_means_are_zero() {
        let summary = Aggregator::summary(&[]);
        assert_eq!(summary.records, 0);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.mean_percent, PerLanguage::new(0.0, 0.0, 0.0));
        assert!(summary.mean_percent.iter().all(|(_, v)| !v.is_nan()));
    }

    // ── percent_series ────────────────────────────────────────────────────────

    #[test]
    fn test_percent_series_scenario() {
        let records = scenario();
        let series = Aggregator::percent_series(&refs(&records));

        assert_eq!(series.years(), vec![2020]);
        let point = series.get(2020).unwrap();
        assert_eq!(point.tuvan_special, 50.0);
        assert!((point.tuvan_latin - 27.5).abs() < 1e-9);
    }

    #[test]
    fn test_percent_series_averages_within_year_only() {
        let records = vec![
            make_record(2019, 1, [(1, 100.0), (0, 0.0), (0, 0.0)], Source::Community),
            make_record(2020, 2, [(1, 40.0), (1, 60.0), (0, 0.0)], Source::Community),
            make_record(2020, 2, [(2, 80.0), (0, 20.0), (0, 0.0)], Source::Official),
        ];
        let series = Aggregator::percent_series(&refs(&records));

        assert_eq!(series.get(2019).unwrap().tuvan_special, 100.0);
        assert!((series.get(2020).unwrap().tuvan_special - 60.0).abs() < 1e-9);
        assert!((series.get(2020).unwrap().tuvan_latin - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_year_keys_sort_numerically() {
        let records = vec![
            make_record(10000, 1, [(1, 1.0), (0, 0.0), (0, 0.0)], Source::Community),
            make_record(2020, 1, [(1, 1.0), (0, 0.0), (0, 0.0)], Source::Community),
            make_record(999, 1, [(1, 1.0), (0, 0.0), (0, 0.0)], Source::Community),
        ];
        let r = refs(&records);

        assert_eq!(Aggregator::percent_series(&r).years(), vec![999, 2020, 10000]);
        assert_eq!(Aggregator::count_series(&r).years(), vec![999, 2020, 10000]);
        assert_eq!(
            Aggregator::stacked_series(&r, &[Source::Community]).years,
            vec![999, 2020, 10000]
        );
    }

    #[test]
    fn test_percent_series_empty() {
        assert!(Aggregator::percent_series(&[]).is_empty());
    }

    // ── count_series ──────────────────────────────────────────────────────────

    #[test]
    fn test_count_series_scenario() {
        let records = scenario();
        let series = Aggregator::count_series(&refs(&records));
        assert_eq!(series.get(2020).unwrap().tuvan_special, 15);
        assert_eq!(series.column(Language::Russian), vec![&7]);
    }

    #[test]
    fn test_count_series_sums_match_summary() {
        let records = vec![
            make_record(2018, 6, [(1, 10.0), (2, 20.0), (3, 70.0)], Source::Community),
            make_record(2019, 9, [(4, 10.0), (0, 0.0), (5, 90.0)], Source::Government),
            make_record(2019, 3, [(1, 10.0), (1, 10.0), (1, 80.0)], Source::Official),
            make_record(2021, 2, [(0, 0.0), (2, 100.0), (0, 0.0)], Source::Official),
        ];
        let r = refs(&records);
        let series = Aggregator::count_series(&r);
        let summary = Aggregator::summary(&r);

        for lang in Language::ALL {
            let by_year: u64 = series.iter().map(|(_, values)| values[lang]).sum();
            assert_eq!(by_year, summary.counts[lang]);
        }
    }

    // ── stacked_series ────────────────────────────────────────────────────────

    #[test]
    fn test_stacked_series_scenario() {
        let records = scenario();
        let stacked = Aggregator::stacked_series(
            &refs(&records),
            &[Source::Community, Source::Government],
        );

        assert_eq!(stacked.years, vec![2020]);
        assert_eq!(stacked.series.len(), 2);
        assert_eq!(stacked.series[0].totals, vec![10]);
        assert_eq!(stacked.series[1].totals, vec![20]);
        assert_eq!(stacked.year_totals(), vec![30]);
    }

    #[test]
    fn test_stacked_series_fills_missing_combinations_with_zero() {
        let records = vec![
            make_record(2019, 4, [(4, 100.0), (0, 0.0), (0, 0.0)], Source::Community),
            make_record(2020, 7, [(7, 100.0), (0, 0.0), (0, 0.0)], Source::Official),
            make_record(2020, 3, [(3, 100.0), (0, 0.0), (0, 0.0)], Source::Official),
        ];
        let stacked = Aggregator::stacked_series(
            &refs(&records),
            &[Source::Official, Source::Government, Source::Community],
        );

        assert_eq!(stacked.years, vec![2019, 2020]);
        assert_eq!(stacked.series[0].source, Source::Official);
        assert_eq!(stacked.series[0].totals, vec![0, 10]);
        assert_eq!(stacked.series[1].totals, vec![0, 0]);
        assert_eq!(stacked.series[2].totals, vec![4, 0]);
        assert_eq!(stacked.value(2019, Source::Community), Some(4));
        assert_eq!(stacked.value(2021, Source::Community), None);
    }

    #[test]
    fn test_stacked_series_no_sources_requested() {
        let records = scenario();
        let stacked = Aggregator::stacked_series(&refs(&records), &[]);
        assert_eq!(stacked.years, vec![2020]);
        assert!(stacked.series.is_empty());
    }

    // ── distribution ──────────────────────────────────────────────────────────

    #[test]
    fn test_distribution_scenario() {
        let records = scenario();
        let dist = Aggregator::distribution(&refs(&records));
        assert_eq!(dist.counts.tuvan_special, 15);
        assert_eq!(dist.total(), 30);

        let shares = dist.shares();
        assert!((shares.tuvan_special - 50.0).abs() < 1e-9);
        let sum: f64 = shares.iter().map(|(_, s)| *s).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_distribution_empty_shares_are_zero() {
        let dist = Aggregator::distribution(&[]);
        assert_eq!(dist.total(), 0);
        assert_eq!(dist.shares(), PerLanguage::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_huge_counts_saturate_instead_of_overflowing() {
        let records = vec![
            make_record(2020, u64::MAX, [(u64::MAX, 100.0), (0, 0.0), (0, 0.0)], Source::Community),
            make_record(2020, 5, [(5, 100.0), (0, 0.0), (0, 0.0)], Source::Community),
        ];
        let r = refs(&records);

        let summary = Aggregator::summary(&r);
        assert_eq!(summary.total, u64::MAX);
        assert_eq!(summary.counts.tuvan_special, u64::MAX);
        assert_eq!(Aggregator::count_series(&r).get(2020).unwrap().tuvan_special, u64::MAX);
        assert_eq!(
            Aggregator::stacked_series(&r, &[Source::Community]).year_totals(),
            vec![u64::MAX]
        );
        assert_eq!(Aggregator::distribution(&r).total(), u64::MAX);
    }

    // ── AggregateViews ────────────────────────────────────────────────────────

    #[test]
    fn test_aggregate_views_bundle() {
        let records = scenario();
        let views = AggregateViews::compute(&refs(&records), &Source::ALL);
        assert_eq!(views.summary.total, 30);
        assert_eq!(views.stacked_series.series.len(), 3);
        assert_eq!(views.stacked_series.value(2020, Source::Official), Some(0));
        assert_eq!(views.distribution.counts, views.summary.counts);
    }

    #[test]
    fn test_views_serialize_year_keys() {
        let records = scenario();
        let series = Aggregator::count_series(&refs(&records));
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["2020"]["tuvan_special"], 15);
    }
}
