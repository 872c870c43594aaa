//! Delimited-text → [`Record`] conversion.
//!
//! Each source's text is parsed with a header row, every data row is mapped
//! onto a typed record tagged with the source it came from, and rows that do
//! not coerce are reported as [`Diagnostic`]s instead of being turned into
//! records with unusable values.

use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim};
use langstat_core::models::{
    Diagnostic, Language, LanguageMetric, PerLanguage, Record, RecordType, RowIssue, Source,
};
use langstat_core::{Result, StatsError};
use tracing::{debug, warn};

// ── ColumnLayout ──────────────────────────────────────────────────────────────

/// Header names of the nine expected columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub year: String,
    pub record_type: String,
    pub total: String,
    pub counts: PerLanguage<String>,
    pub percents: PerLanguage<String>,
}

impl ColumnLayout {
    /// Russian headers, as produced by the detector that writes the results.
    pub fn russian() -> Self {
        Self {
            year: "Год".into(),
            record_type: "Тип".into(),
            total: "Всего".into(),
            counts: PerLanguage::new(
                "Тувинский_ңөү_кол".into(),
                "Тувинский_рус_клав_кол".into(),
                "Русский_кол".into(),
            ),
            percents: PerLanguage::new(
                "Тувинский_ңөү_%".into(),
                "Тувинский_рус_клав_%".into(),
                "Русский_%".into(),
            ),
        }
    }

    /// English headers.
    pub fn english() -> Self {
        Self {
            year: "year".into(),
            record_type: "type".into(),
            total: "total".into(),
            counts: PerLanguage::new(
                "tuvan_special_count".into(),
                "tuvan_latin_count".into(),
                "russian_count".into(),
            ),
            percents: PerLanguage::new(
                "tuvan_special_percent".into(),
                "tuvan_latin_percent".into(),
                "russian_percent".into(),
            ),
        }
    }

    /// Layout by short name (`"ru"` or `"en"`).
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "ru" => Some(Self::russian()),
            "en" => Some(Self::english()),
            _ => None,
        }
    }
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self::russian()
    }
}

/// Column positions resolved against an actual header row.
struct ColumnIndex<'a> {
    layout: &'a ColumnLayout,
    year: usize,
    record_type: usize,
    total: usize,
    counts: PerLanguage<usize>,
    percents: PerLanguage<usize>,
}

impl<'a> ColumnIndex<'a> {
    fn resolve(headers: &StringRecord, layout: &'a ColumnLayout, source: Source) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| StatsError::MissingColumn {
                    origin: source,
                    column: name.to_string(),
                })
        };

        let mut counts = PerLanguage::default();
        let mut percents = PerLanguage::default();
        for lang in Language::ALL {
            counts[lang] = find(&layout.counts[lang])?;
            percents[lang] = find(&layout.percents[lang])?;
        }

        Ok(Self {
            layout,
            year: find(&layout.year)?,
            record_type: find(&layout.record_type)?,
            total: find(&layout.total)?,
            counts,
            percents,
        })
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Records and diagnostics produced from one source's text.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSource {
    pub records: Vec<Record>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse `text` (header row plus data rows) into records tagged with `source`.
///
/// Fails only when the header cannot be read or lacks a layout column; every
/// row-level problem becomes a [`Diagnostic`]. Rows whose `total` disagrees
/// with the sum of the three counts are kept and flagged.
pub fn normalize(text: &str, source: Source, layout: &ColumnLayout) -> Result<NormalizedSource> {
    // Results files are written as utf-8-sig.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| StatsError::Header {
            origin: source,
            reason: e.to_string(),
        })?
        .clone();
    let columns = ColumnIndex::resolve(&headers, layout, source)?;

    let mut out = NormalizedSource::default();

    for (row, result) in reader.records().enumerate() {
        let position = match &result {
            Ok(raw) => raw.position(),
            Err(e) => e.position(),
        };
        // Blank lines are skipped by the reader, so `row` alone cannot locate
        // the record in the file.
        let line = position.map_or(row as u64 + 2, |p| p.line());

        let parsed = result
            .map_err(|e| RowIssue::Malformed {
                message: e.to_string(),
            })
            .and_then(|raw| parse_row(&raw, &columns, source))
            .and_then(|record| match record.counts_sum() {
                Some(counts) => Ok((record, counts)),
                None => Err(RowIssue::CountOverflow),
            });

        match parsed {
            Ok((record, counts)) => {
                if record.total != counts {
                    warn!(%source, line, total = record.total, counts, "total differs from language counts");
                    out.diagnostics.push(Diagnostic {
                        source,
                        row,
                        line,
                        issue: RowIssue::TotalMismatch {
                            total: record.total,
                            counts,
                        },
                    });
                }
                out.records.push(record);
            }
            Err(issue) => {
                warn!(%source, line, %issue, "skipping row");
                out.diagnostics.push(Diagnostic {
                    source,
                    row,
                    line,
                    issue,
                });
            }
        }
    }

    debug!(
        %source,
        records = out.records.len(),
        diagnostics = out.diagnostics.len(),
        "normalized source"
    );

    Ok(out)
}

// ── Row parsing ───────────────────────────────────────────────────────────────

fn parse_row(
    raw: &StringRecord,
    columns: &ColumnIndex<'_>,
    source: Source,
) -> std::result::Result<Record, RowIssue> {
    let layout = columns.layout;

    let year = parse_integer::<i32>(field(raw, columns.year, &layout.year)?, &layout.year)?;
    let record_type = RecordType::from_label(field(raw, columns.record_type, &layout.record_type)?);
    let total = parse_integer::<u64>(field(raw, columns.total, &layout.total)?, &layout.total)?;

    let mut metrics = PerLanguage::<LanguageMetric>::default();
    for lang in Language::ALL {
        let count_col = &layout.counts[lang];
        let percent_col = &layout.percents[lang];
        metrics[lang] = LanguageMetric {
            count: parse_integer(field(raw, columns.counts[lang], count_col)?, count_col)?,
            percent: parse_percent(field(raw, columns.percents[lang], percent_col)?, percent_col)?,
        };
    }

    Ok(Record {
        year,
        record_type,
        total,
        metrics,
        source,
    })
}

fn field<'r>(
    raw: &'r StringRecord,
    index: usize,
    column: &str,
) -> std::result::Result<&'r str, RowIssue> {
    raw.get(index).ok_or_else(|| RowIssue::MissingField {
        column: column.to_string(),
    })
}

/// Strict base-10: the whole field must be digits (with an optional sign).
fn parse_integer<T: FromStr>(value: &str, column: &str) -> std::result::Result<T, RowIssue> {
    value.parse::<T>().map_err(|_| RowIssue::InvalidInteger {
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Finite floating-point only; `NaN` and infinities are rejected.
fn parse_percent(value: &str, column: &str) -> std::result::Result<f64, RowIssue> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RowIssue::InvalidPercent {
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
