//! Static display strings in Russian and English.
//!
//! Labels only ever decorate output; nothing numeric depends on them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{Language, RecordType, Source};

/// Display locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    En,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Locale::Ru => "ru",
            Locale::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ru" => Ok(Locale::Ru),
            "en" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// Fixed UI strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    SummaryTitle,
    PercentSeriesTitle,
    CountSeriesTitle,
    StackedSeriesTitle,
    DistributionTitle,
    Year,
    Total,
    TotalRecords,
    Average,
    Share,
    NoData,
    NoDataHint,
    Diagnostics,
    FilterYears,
    FilterTypes,
    FilterSources,
    Unrestricted,
}

pub fn text(locale: Locale, key: Text) -> &'static str {
    use Text::*;
    match (locale, key) {
        (Locale::Ru, SummaryTitle) => "Сводная информация (отфильтрованные данные)",
        (Locale::En, SummaryTitle) => "Summary Information (filtered data)",
        (Locale::Ru, PercentSeriesTitle) => "Динамика процентного соотношения языков",
        (Locale::En, PercentSeriesTitle) => "Language Percentage Dynamics",
        (Locale::Ru, CountSeriesTitle) => "Количество записей по языкам",
        (Locale::En, CountSeriesTitle) => "Number of Records by Language",
        (Locale::Ru, StackedSeriesTitle) => "Распределение по источникам данных",
        (Locale::En, StackedSeriesTitle) => "Distribution by Data Source",
        (Locale::Ru, DistributionTitle) => "Общее распределение по языкам",
        (Locale::En, DistributionTitle) => "Overall Language Distribution",
        (Locale::Ru, Year) => "Год",
        (Locale::En, Year) => "Year",
        (Locale::Ru, Total) => "Всего",
        (Locale::En, Total) => "Total",
        (Locale::Ru, TotalRecords) => "Всего записей",
        (Locale::En, TotalRecords) => "Total Records",
        (Locale::Ru, Average) => "средний",
        (Locale::En, Average) => "average",
        (Locale::Ru, Share) => "Доля",
        (Locale::En, Share) => "Share",
        (Locale::Ru, NoData) => "Нет данных для отображения с выбранными фильтрами.",
        (Locale::En, NoData) => "No data to display with selected filters.",
        (Locale::Ru, NoDataHint) => "Попробуйте изменить параметры фильтрации.",
        (Locale::En, NoDataHint) => "Try changing the filter parameters.",
        (Locale::Ru, Diagnostics) => "Пропущенные или подозрительные строки",
        (Locale::En, Diagnostics) => "Skipped or suspicious rows",
        (Locale::Ru, FilterYears) => "Годы",
        (Locale::En, FilterYears) => "Years",
        (Locale::Ru, FilterTypes) => "Тип данных",
        (Locale::En, FilterTypes) => "Data type",
        (Locale::Ru, FilterSources) => "Источники данных",
        (Locale::En, FilterSources) => "Data sources",
        (Locale::Ru, Unrestricted) => "все",
        (Locale::En, Unrestricted) => "all",
    }
}

pub fn source_label(locale: Locale, source: Source) -> &'static str {
    match (locale, source) {
        (Locale::Ru, Source::Community) => "Сообщества",
        (Locale::Ru, Source::Government) => "Госучреждения",
        (Locale::Ru, Source::Official) => "Официальные СМИ",
        (Locale::En, Source::Community) => "Communities",
        (Locale::En, Source::Government) => "Government Institutions",
        (Locale::En, Source::Official) => "Official Media",
    }
}

pub fn language_label(locale: Locale, language: Language) -> &'static str {
    match (locale, language) {
        (Locale::Ru, Language::TuvanSpecial) => "Тувинский (ңөү)",
        (Locale::Ru, Language::TuvanLatin) => "Тувинский (рус. клав.)",
        (Locale::Ru, Language::Russian) => "Русский",
        (Locale::En, Language::TuvanSpecial) => "Tuvan (ңөү)",
        (Locale::En, Language::TuvanLatin) => "Tuvan (Rus. keyboard)",
        (Locale::En, Language::Russian) => "Russian",
    }
}

/// Unrecognised types are shown as their raw label.
pub fn type_label(locale: Locale, record_type: &RecordType) -> String {
    match (locale, record_type) {
        (Locale::Ru, RecordType::Post) => "Посты".to_string(),
        (Locale::Ru, RecordType::Comment) => "Комментарии".to_string(),
        (Locale::En, RecordType::Post) => "Posts".to_string(),
        (Locale::En, RecordType::Comment) => "Comments".to_string(),
        (_, RecordType::Other(label)) => label.clone(),
    }
}
