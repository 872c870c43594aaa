//! Filter selection over years, record types and sources.
//!
//! An empty dimension is unrestricted. The selection only narrows the record
//! set; aggregation happens afterwards in [`crate::aggregator`].

use std::collections::BTreeSet;

use langstat_core::models::{Record, RecordType, Source};
use serde::Serialize;

use crate::repository::Repository;

// ── FilterSelection ──────────────────────────────────────────────────────────

/// One of the three filter dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Year,
    Type,
    Source,
}

/// The user's current choice of years, record types and sources.
///
/// An empty dimension means "no restriction", not "exclude everything".
/// Sources keep their insertion order, which is the series order of the
/// stacked view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSelection {
    pub years: BTreeSet<i32>,
    pub types: BTreeSet<RecordType>,
    pub sources: Vec<Source>,
}

impl FilterSelection {
    /// Everything the repository offers selected.
    pub fn all_of(repo: &Repository) -> Self {
        Self {
            years: repo.years().iter().copied().collect(),
            types: repo.types().iter().cloned().collect(),
            sources: repo.sources().to_vec(),
        }
    }

    /// Build from explicit lists; duplicate sources keep their first position.
    pub fn new(
        years: impl IntoIterator<Item = i32>,
        types: impl IntoIterator<Item = RecordType>,
        sources: impl IntoIterator<Item = Source>,
    ) -> Self {
        let mut selection = Self {
            years: years.into_iter().collect(),
            types: types.into_iter().collect(),
            sources: Vec::new(),
        };
        for source in sources {
            if !selection.sources.contains(&source) {
                selection.sources.push(source);
            }
        }
        selection
    }

    /// `true` when every dimension passes `record`.
    pub fn matches(&self, record: &Record) -> bool {
        let year_ok = self.years.is_empty() || self.years.contains(&record.year);
        let type_ok = self.types.is_empty() || self.types.contains(&record.record_type);
        let source_ok = self.sources.is_empty() || self.sources.contains(&record.source);
        year_ok && type_ok && source_ok
    }

    pub fn toggle_year(&mut self, year: i32) {
        if !self.years.remove(&year) {
            self.years.insert(year);
        }
    }

    pub fn toggle_type(&mut self, record_type: &RecordType) {
        if !self.types.remove(record_type) {
            self.types.insert(record_type.clone());
        }
    }

    /// Select every value `repo` offers for `dimension`.
    pub fn select_all_in(&mut self, dimension: Dimension, repo: &Repository) {
        match dimension {
            Dimension::Year => self.years = repo.years().iter().copied().collect(),
            Dimension::Type => self.types = repo.types().iter().cloned().collect(),
            Dimension::Source => self.sources = repo.sources().to_vec(),
        }
    }

    /// Empty `dimension`, lifting its restriction.
    pub fn clear(&mut self, dimension: Dimension) {
        match dimension {
            Dimension::Year => self.years.clear(),
            Dimension::Type => self.types.clear(),
            Dimension::Source => self.sources.clear(),
        }
    }

    /// Re-selecting a source appends it after the ones already selected.
    pub fn toggle_source(&mut self, source: Source) {
        if let Some(pos) = self.sources.iter().position(|s| *s == source) {
            self.sources.remove(pos);
        } else {
            self.sources.push(source);
        }
    }
}

// ── Filtering ────────────────────────────────────────────────────────────────

/// Records passing every dimension; an empty set does not restrict.
pub fn filter_records<'a>(
    records: &'a [Record],
    years: &BTreeSet<i32>,
    types: &BTreeSet<RecordType>,
    sources: &[Source],
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|r| years.is_empty() || years.contains(&r.year))
        .filter(|r| types.is_empty() || types.contains(&r.record_type))
        .filter(|r| sources.is_empty() || sources.contains(&r.source))
        .collect()
}

/// [`filter_records`] driven by a [`FilterSelection`].
pub fn apply<'a>(records: &'a [Record], selection: &FilterSelection) -> Vec<&'a Record> {
    filter_records(
        records,
        &selection.years,
        &selection.types,
        &selection.sources,
    )
}
