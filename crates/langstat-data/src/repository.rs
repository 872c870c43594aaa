//! The record set of the most recent successful load.

use std::collections::BTreeSet;

use langstat_core::models::{Record, RecordType, Source};

/// Holds all records of one load plus the filter domains derived from them.
///
/// Replacement swaps a fully built value in one move, so readers never see a
/// half-replaced set and a failed load simply never calls [`replace`].
///
/// [`replace`]: Repository::replace
#[derive(Debug, Clone, Default)]
pub struct Repository {
    records: Vec<Record>,
    years: Vec<i32>,
    types: Vec<RecordType>,
}

impl Repository {
    pub fn new(records: Vec<Record>) -> Self {
        let years: BTreeSet<i32> = records.iter().map(|r| r.year).collect();
        let types: BTreeSet<RecordType> = records.iter().map(|r| r.record_type.clone()).collect();
        Self {
            records,
            years: years.into_iter().collect(),
            types: types.into_iter().collect(),
        }
    }

    /// Swap in a new record set, discarding the previous one wholesale.
    pub fn replace(&mut self, records: Vec<Record>) {
        *self = Self::new(records);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Distinct record types in [`RecordType`] order.
    pub fn types(&self) -> &[RecordType] {
        &self.types
    }

    /// Sources are structural, not discovered: always all three.
    pub fn sources(&self) -> [Source; 3] {
        Source::ALL
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
