use std::str::FromStr;

use langstat_core::formatting::{format_count, format_percent};
use langstat_core::labels::{language_label, source_label, text, type_label, Locale, Text};
use langstat_core::models::{Diagnostic, Language};
use langstat_data::aggregator::{
    AggregateViews, Distribution, StackedSeries, Summary, TimeSeries,
};
use langstat_data::filter::FilterSelection;
use langstat_runtime::dashboard::LoadReport;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

// ── Selectors ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

/// Which aggregate view(s) to print.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    All,
    Summary,
    Percent,
    Counts,
    Stacked,
    Distribution,
}

impl View {
    fn includes(self, other: View) -> bool {
        self == View::All || self == other
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(View::All),
            "summary" => Ok(View::Summary),
            "percent" => Ok(View::Percent),
            "counts" => Ok(View::Counts),
            "stacked" => Ok(View::Stacked),
            "distribution" => Ok(View::Distribution),
            other => Err(format!("unknown view '{other}'")),
        }
    }
}

// ── Table output ─────────────────────────────────────────────────────────────

/// Render the requested views as titled tables.
pub fn render_tables(views: &AggregateViews, view: View, locale: Locale) -> String {
    if views.summary.records == 0 {
        return format!(
            "{}\n{}",
            text(locale, Text::NoData),
            text(locale, Text::NoDataHint)
        );
    }

    let mut sections: Vec<(Text, Table)> = Vec::new();
    if view.includes(View::Summary) {
        sections.push((Text::SummaryTitle, summary_table(&views.summary, locale)));
    }
    if view.includes(View::Percent) {
        sections.push((
            Text::PercentSeriesTitle,
            series_table(&views.percent_series, locale, |v| format_percent(*v)),
        ));
    }
    if view.includes(View::Counts) {
        sections.push((
            Text::CountSeriesTitle,
            series_table(&views.count_series, locale, |v| format_count(*v)),
        ));
    }
    if view.includes(View::Stacked) {
        sections.push((
            Text::StackedSeriesTitle,
            stacked_table(&views.stacked_series, locale),
        ));
    }
    if view.includes(View::Distribution) {
        sections.push((
            Text::DistributionTitle,
            distribution_table(&views.distribution, locale),
        ));
    }

    sections
        .into_iter()
        .map(|(title, table)| format!("{}\n{}", text(locale, title), table))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One line per filter dimension; an empty dimension prints as unrestricted.
pub fn render_selection(selection: &FilterSelection, locale: Locale) -> String {
    let line = |key: Text, values: Vec<String>| {
        let values = if values.is_empty() {
            text(locale, Text::Unrestricted).to_string()
        } else {
            values.join(", ")
        };
        format!("{}: {}", text(locale, key), values)
    };
    [
        line(
            Text::FilterYears,
            selection.years.iter().map(i32::to_string).collect(),
        ),
        line(
            Text::FilterTypes,
            selection
                .types
                .iter()
                .map(|ty| type_label(locale, ty))
                .collect(),
        ),
        line(
            Text::FilterSources,
            selection
                .sources
                .iter()
                .map(|s| source_label(locale, *s).to_string())
                .collect(),
        ),
    ]
    .join("\n")
}

fn styled(builder: Builder) -> Table {
    let mut table = builder.build();
    table.with(Style::rounded());
    table
}

fn summary_table(summary: &Summary, locale: Locale) -> Table {
    let mut builder = Builder::default();
    builder.push_record([
        String::new(),
        text(locale, Text::Total).to_string(),
        text(locale, Text::Average).to_string(),
    ]);
    builder.push_record([
        text(locale, Text::TotalRecords).to_string(),
        format_count(summary.total),
        String::new(),
    ]);
    for lang in Language::ALL {
        builder.push_record([
            language_label(locale, lang).to_string(),
            format_count(summary.counts[lang]),
            format_percent(summary.mean_percent[lang]),
        ]);
    }
    styled(builder)
}

fn series_table<T>(
    series: &TimeSeries<T>,
    locale: Locale,
    format_value: impl Fn(&T) -> String,
) -> Table {
    let mut builder = Builder::default();
    let mut header = vec![text(locale, Text::Year).to_string()];
    header.extend(Language::ALL.map(|lang| language_label(locale, lang).to_string()));
    builder.push_record(header);

    for (year, values) in series.iter() {
        let mut row = vec![year.to_string()];
        row.extend(Language::ALL.map(|lang| format_value(&values[lang])));
        builder.push_record(row);
    }
    styled(builder)
}

fn stacked_table(stacked: &StackedSeries, locale: Locale) -> Table {
    let mut builder = Builder::default();
    let mut header = vec![text(locale, Text::Year).to_string()];
    header.extend(
        stacked
            .series
            .iter()
            .map(|s| source_label(locale, s.source).to_string()),
    );
    header.push(text(locale, Text::Total).to_string());
    builder.push_record(header);

    let year_totals = stacked.year_totals();
    for (idx, year) in stacked.years.iter().enumerate() {
        let mut row = vec![year.to_string()];
        row.extend(stacked.series.iter().map(|s| format_count(s.totals[idx])));
        row.push(format_count(year_totals[idx]));
        builder.push_record(row);
    }
    styled(builder)
}

fn distribution_table(distribution: &Distribution, locale: Locale) -> Table {
    let shares = distribution.shares();
    let mut builder = Builder::default();
    builder.push_record([
        String::new(),
        text(locale, Text::Total).to_string(),
        text(locale, Text::Share).to_string(),
    ]);
    for lang in Language::ALL {
        builder.push_record([
            language_label(locale, lang).to_string(),
            format_count(distribution.counts[lang]),
            format_percent(shares[lang]),
        ]);
    }
    styled(builder)
}

// ── Diagnostics ──────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct DiagnosticRow {
    #[tabled(rename = "Source")]
    source: String,
    /// Line in the file, counting the header as line 1.
    #[tabled(rename = "Line")]
    line: u64,
    #[tabled(rename = "Issue")]
    issue: String,
}

fn build_diagnostic_rows(diagnostics: &[Diagnostic]) -> Vec<DiagnosticRow> {
    diagnostics
        .iter()
        .map(|d| DiagnosticRow {
            source: d.source.to_string(),
            line: d.line,
            issue: d.issue.to_string(),
        })
        .collect()
}

/// Titled table of skipped and suspicious rows, for stderr.
pub fn render_diagnostics(diagnostics: &[Diagnostic], locale: Locale) -> String {
    let mut table = Table::new(build_diagnostic_rows(diagnostics));
    table.with(Style::rounded());
    format!("{}\n{}", text(locale, Text::Diagnostics), table)
}

// ── JSON output ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonOutput<'a> {
    load: &'a LoadReport,
    selection: &'a FilterSelection,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a Summary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    percent_series: Option<&'a TimeSeries<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count_series: Option<&'a TimeSeries<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stacked_series: Option<&'a StackedSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distribution: Option<&'a Distribution>,
}

/// Pretty JSON with the load report, the active selection and the views.
pub fn render_json(
    views: &AggregateViews,
    view: View,
    report: &LoadReport,
    selection: &FilterSelection,
) -> serde_json::Result<String> {
    let output = JsonOutput {
        load: report,
        selection,
        summary: view.includes(View::Summary).then_some(&views.summary),
        percent_series: view.includes(View::Percent).then_some(&views.percent_series),
        count_series: view.includes(View::Counts).then_some(&views.count_series),
        stacked_series: view.includes(View::Stacked).then_some(&views.stacked_series),
        distribution: view
            .includes(View::Distribution)
            .then_some(&views.distribution),
    };
    serde_json::to_string_pretty(&output)
}
