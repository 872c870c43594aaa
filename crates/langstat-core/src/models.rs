use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

// ── Source ────────────────────────────────────────────────────────────────────

/// Origin category of a record, tied 1:1 to one input resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Community media groups.
    Community,
    /// Government institutions.
    Government,
    /// Official media outlets.
    Official,
}

impl Source {
    /// All sources in canonical order.
    pub const ALL: [Source; 3] = [Source::Community, Source::Government, Source::Official];

    /// Lowercase identifier used on the command line and in JSON.
    pub fn id(self) -> &'static str {
        match self {
            Source::Community => "community",
            Source::Government => "government",
            Source::Official => "official",
        }
    }

    /// Name of the delimited-text resource holding this source's rows.
    pub fn file_name(self) -> &'static str {
        match self {
            Source::Community => "results_community_media_posts.csv",
            Source::Government => "results_gov_institutions_posts.csv",
            Source::Official => "results_official_media_posts.csv",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "community" => Ok(Source::Community),
            "government" => Ok(Source::Government),
            "official" => Ok(Source::Official),
            other => Err(format!("unknown source: {other}")),
        }
    }
}

// ── RecordType ────────────────────────────────────────────────────────────────

/// Canonical record type. Locale variants of the same label collapse onto one
/// variant; anything unrecognised is carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Post,
    Comment,
    Other(String),
}

impl RecordType {
    /// Canonicalise a raw type label.
    ///
    /// ```
    /// use langstat_core::models::RecordType;
    ///
    /// assert_eq!(RecordType::from_label("Посты"), RecordType::Post);
    /// assert_eq!(RecordType::from_label(" comments "), RecordType::Comment);
    /// assert_eq!(RecordType::from_label("Reposts"), RecordType::Other("Reposts".into()));
    /// ```
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_lowercase().as_str() {
            "посты" | "пост" | "posts" | "post" => RecordType::Post,
            "комментарии" | "комментарий" | "comments" | "comment" => RecordType::Comment,
            _ => RecordType::Other(trimmed.to_string()),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Post => f.write_str("post"),
            RecordType::Comment => f.write_str("comment"),
            RecordType::Other(label) => f.write_str(label),
        }
    }
}

// ── Language ──────────────────────────────────────────────────────────────────

/// The three tracked language groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// Tuvan written with its special letters (ң, ө, ү).
    TuvanSpecial,
    /// Tuvan typed on a keyboard without the special letters.
    TuvanLatin,
    Russian,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::TuvanSpecial, Language::TuvanLatin, Language::Russian];
}

/// One value per [`Language`], in a fixed order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerLanguage<T> {
    pub tuvan_special: T,
    pub tuvan_latin: T,
    pub russian: T,
}

impl<T> PerLanguage<T> {
    pub fn new(tuvan_special: T, tuvan_latin: T, russian: T) -> Self {
        Self {
            tuvan_special,
            tuvan_latin,
            russian,
        }
    }

    /// Build from a function evaluated once per language.
    pub fn from_fn(mut f: impl FnMut(Language) -> T) -> Self {
        Self {
            tuvan_special: f(Language::TuvanSpecial),
            tuvan_latin: f(Language::TuvanLatin),
            russian: f(Language::Russian),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> PerLanguage<U> {
        PerLanguage {
            tuvan_special: f(&self.tuvan_special),
            tuvan_latin: f(&self.tuvan_latin),
            russian: f(&self.russian),
        }
    }

    /// `(language, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Language, &T)> {
        Language::ALL.into_iter().map(move |lang| (lang, &self[lang]))
    }
}

impl<T> Index<Language> for PerLanguage<T> {
    type Output = T;

    fn index(&self, lang: Language) -> &T {
        match lang {
            Language::TuvanSpecial => &self.tuvan_special,
            Language::TuvanLatin => &self.tuvan_latin,
            Language::Russian => &self.russian,
        }
    }
}

impl<T> IndexMut<Language> for PerLanguage<T> {
    fn index_mut(&mut self, lang: Language) -> &mut T {
        match lang {
            Language::TuvanSpecial => &mut self.tuvan_special,
            Language::TuvanLatin => &mut self.tuvan_latin,
            Language::Russian => &mut self.russian,
        }
    }
}

// ── Record ────────────────────────────────────────────────────────────────────

/// Count and share of one language within a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageMetric {
    pub count: u64,
    /// Expected in `[0, 100]`; not validated on ingestion.
    pub percent: f64,
}

impl LanguageMetric {
    pub fn new(count: u64, percent: f64) -> Self {
        Self { count, percent }
    }
}

/// One normalised row of language-usage statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub year: i32,
    pub record_type: RecordType,
    /// Expected to equal the sum of the three counts; not enforced.
    pub total: u64,
    pub metrics: PerLanguage<LanguageMetric>,
    pub source: Source,
}

impl Record {
    /// Sum of the three per-language counts; `None` if it overflows `u64`.
    pub fn counts_sum(&self) -> Option<u64> {
        self.metrics
            .iter()
            .try_fold(0u64, |acc, (_, m)| acc.checked_add(m.count))
    }
}

// ── Diagnostics ───────────────────────────────────────────────────────────────

/// Problem found in a single input row.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowIssue {
    #[error("column {column}: '{value}' is not a base-10 integer")]
    InvalidInteger { column: String, value: String },

    #[error("column {column}: '{value}' is not a finite number")]
    InvalidPercent { column: String, value: String },

    #[error("column {column} is missing")]
    MissingField { column: String },

    #[error("malformed row: {message}")]
    Malformed { message: String },

    #[error("sum of language counts does not fit in 64 bits")]
    CountOverflow,

    /// The row is kept; `total` disagrees with the sum of the counts.
    #[error("total {total} differs from the sum of language counts {counts}")]
    TotalMismatch { total: u64, counts: u64 },
}

/// A row-level issue tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub source: Source,
    /// 0-based data row index within the source (header excluded).
    pub row: usize,
    /// 1-based line in the source text; the header is line 1.
    pub line: u64,
    pub issue: RowIssue,
}

impl Diagnostic {
    /// `true` when the row was excluded from the record set.
    pub fn is_rejection(&self) -> bool {
        !matches!(self.issue, RowIssue::TotalMismatch { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} line {}: {}", self.source, self.line, self.issue)
    }
}
