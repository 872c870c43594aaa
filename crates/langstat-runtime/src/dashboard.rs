//! Pipeline state holder.
//!
//! [`Dashboard`] owns the [`Repository`] of the latest successful load and
//! the current [`FilterSelection`]. Aggregates are recomputed on request from
//! an immutable snapshot; observers hear about every status, dataset and
//! selection change synchronously.
//!
//! Loads come in two halves so a caller can run several without holding the
//! dashboard across the await: [`Dashboard::begin_load`] hands out a
//! [`LoadRequest`] tagged with a generation number, and
//! [`Dashboard::apply`] accepts its [`LoadOutcome`] only when no newer
//! request has been issued since.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use langstat_core::models::{Diagnostic, Record, RecordType, Source};
use langstat_core::{Result, StatsError};
use langstat_data::aggregator::{
    AggregateViews, Aggregator, Distribution, StackedSeries, Summary, TimeSeries,
};
use langstat_data::filter::{self, Dimension, FilterSelection};
use langstat_data::loader::{Loader, NormalizedSet, SourceFetcher};
use langstat_data::repository::Repository;
use serde::Serialize;

use crate::events::{DashboardEvent, Observer, ObserverRegistry, SubscriptionId};

// ── PipelineStatus ────────────────────────────────────────────────────────────

/// Where the pipeline is in its load cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Nothing has been requested yet.
    Idle,
    Loading,
    Ready,
    /// The last load failed; previously loaded data is still served.
    Failed(String),
}

impl PipelineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, PipelineStatus::Ready)
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStatus::Idle => f.write_str("idle"),
            PipelineStatus::Loading => f.write_str("loading"),
            PipelineStatus::Ready => f.write_str("ready"),
            PipelineStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

// ── LoadReport ────────────────────────────────────────────────────────────────

/// Metadata about a successful load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Records kept across all sources.
    pub records: usize,
    pub per_source: BTreeMap<Source, usize>,
    /// Rejected rows and non-fatal notices, in source then row order.
    pub diagnostics: Vec<Diagnostic>,
    pub loaded_at: DateTime<Utc>,
    pub load_time_seconds: f64,
}

impl LoadReport {
    fn from_set(set: &NormalizedSet, elapsed: Duration) -> Self {
        Self {
            records: set.records.len(),
            per_source: Source::ALL
                .into_iter()
                .map(|source| (source, set.count_for(source)))
                .collect(),
            diagnostics: set.diagnostics.clone(),
            loaded_at: Utc::now(),
            load_time_seconds: elapsed.as_secs_f64(),
        }
    }

    /// Number of rows that were excluded from the record set.
    pub fn rejected_rows(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_rejection()).count()
    }
}

// ── LoadRequest / LoadOutcome ─────────────────────────────────────────────────

/// A pending load, detached from the dashboard that issued it.
pub struct LoadRequest<F: SourceFetcher> {
    generation: u64,
    loader: Loader<F>,
}

impl<F: SourceFetcher> LoadRequest<F> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fetch and normalise all three sources.
    pub async fn run(self) -> LoadOutcome {
        let started = Instant::now();
        let result = self.loader.load_all().await;
        LoadOutcome {
            generation: self.generation,
            result,
            elapsed: started.elapsed(),
        }
    }
}

/// Result of a [`LoadRequest`], to be handed back to [`Dashboard::apply`].
#[derive(Debug)]
pub struct LoadOutcome {
    generation: u64,
    result: Result<NormalizedSet>,
    elapsed: Duration,
}

impl LoadOutcome {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ── Dashboard ─────────────────────────────────────────────────────────────────

/// Current dataset, selection and status, plus the observers watching them.
pub struct Dashboard<F: SourceFetcher> {
    loader: Loader<F>,
    repository: Repository,
    selection: FilterSelection,
    status: PipelineStatus,
    /// Generation of the most recently issued load request.
    generation: u64,
    last_report: Option<LoadReport>,
    observers: ObserverRegistry,
}

impl<F: SourceFetcher> Dashboard<F> {
    pub fn new(loader: Loader<F>) -> Self {
        Self {
            loader,
            repository: Repository::default(),
            selection: FilterSelection::default(),
            status: PipelineStatus::Idle,
            generation: 0,
            last_report: None,
            observers: ObserverRegistry::default(),
        }
    }

    // ── Loading ───────────────────────────────────────────────────────────

    /// Load all sources and apply the result in one step.
    pub async fn load(&mut self) -> Result<LoadReport> {
        let request = self.begin_load();
        let outcome = request.run().await;
        self.apply(outcome)
    }

    /// Start a new load; any request issued earlier becomes stale.
    pub fn begin_load(&mut self) -> LoadRequest<F> {
        self.generation += 1;
        tracing::debug!(generation = self.generation, "load requested");
        self.set_status(PipelineStatus::Loading);
        LoadRequest {
            generation: self.generation,
            loader: self.loader.clone(),
        }
    }

    /// Apply a finished load.
    ///
    /// A stale outcome is discarded with [`StatsError::Superseded`] and
    /// changes nothing. A failed outcome keeps the current data and selection
    /// and moves to [`PipelineStatus::Failed`]. A successful one replaces the
    /// repository and resets the selection to every available value.
    pub fn apply(&mut self, outcome: LoadOutcome) -> Result<LoadReport> {
        if outcome.generation != self.generation {
            tracing::debug!(
                stale = outcome.generation,
                current = self.generation,
                "discarding superseded load outcome"
            );
            return Err(StatsError::Superseded {
                generation: outcome.generation,
            });
        }

        let set = match outcome.result {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!(error = %e, "load failed; keeping previous data");
                self.set_status(PipelineStatus::Failed(e.to_string()));
                return Err(e);
            }
        };

        let report = LoadReport::from_set(&set, outcome.elapsed);
        self.repository.replace(set.records);
        self.selection = FilterSelection::all_of(&self.repository);
        self.last_report = Some(report.clone());

        tracing::info!(
            records = report.records,
            rejected = report.rejected_rows(),
            load_time_seconds = report.load_time_seconds,
            "dataset loaded"
        );

        self.observers.notify(&DashboardEvent::DatasetReplaced {
            records: self.repository.len(),
            years: self.repository.years().to_vec(),
        });
        self.observers
            .notify(&DashboardEvent::SelectionChanged(self.selection.clone()));
        self.set_status(PipelineStatus::Ready);

        Ok(report)
    }

    pub fn status(&self) -> &PipelineStatus {
        &self.status
    }

    /// Report of the last load that was applied successfully.
    pub fn last_report(&self) -> Option<&LoadReport> {
        self.last_report.as_ref()
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    // ── Domains ───────────────────────────────────────────────────────────

    pub fn available_years(&self) -> &[i32] {
        self.repository.years()
    }

    pub fn available_types(&self) -> &[RecordType] {
        self.repository.types()
    }

    pub fn available_sources(&self) -> [Source; 3] {
        self.repository.sources()
    }

    // ── Selection ─────────────────────────────────────────────────────────

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    /// Replace the whole selection. Empty collections mean "no restriction".
    pub fn set_filter(
        &mut self,
        years: impl IntoIterator<Item = i32>,
        types: impl IntoIterator<Item = RecordType>,
        sources: impl IntoIterator<Item = Source>,
    ) {
        self.set_selection(FilterSelection::new(years, types, sources));
    }

    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.selection = selection;
        self.selection_changed();
    }

    /// Select every year, type and source of the current dataset.
    pub fn select_all(&mut self) {
        self.set_selection(FilterSelection::all_of(&self.repository));
    }

    /// Select every available value of one dimension.
    pub fn select_all_in(&mut self, dimension: Dimension) {
        self.selection.select_all_in(dimension, &self.repository);
        self.selection_changed();
    }

    pub fn clear(&mut self, dimension: Dimension) {
        self.selection.clear(dimension);
        self.selection_changed();
    }

    pub fn toggle_year(&mut self, year: i32) {
        self.selection.toggle_year(year);
        self.selection_changed();
    }

    pub fn toggle_type(&mut self, record_type: &RecordType) {
        self.selection.toggle_type(record_type);
        self.selection_changed();
    }

    pub fn toggle_source(&mut self, source: Source) {
        self.selection.toggle_source(source);
        self.selection_changed();
    }

    // ── Views ─────────────────────────────────────────────────────────────

    pub fn filtered_records(&self) -> Vec<&Record> {
        filter::apply(self.repository.records(), &self.selection)
    }

    pub fn summary(&self) -> Summary {
        Aggregator::summary(&self.filtered_records())
    }

    pub fn percent_series(&self) -> TimeSeries<f64> {
        Aggregator::percent_series(&self.filtered_records())
    }

    pub fn count_series(&self) -> TimeSeries<u64> {
        Aggregator::count_series(&self.filtered_records())
    }

    pub fn stacked_series(&self, ordered_sources: &[Source]) -> StackedSeries {
        Aggregator::stacked_series(&self.filtered_records(), ordered_sources)
    }

    pub fn distribution(&self) -> Distribution {
        Aggregator::distribution(&self.filtered_records())
    }

    /// All five views; the stacked series follows the selected sources, or
    /// every source when the source dimension is unrestricted.
    pub fn views(&self) -> AggregateViews {
        let sources: Vec<Source> = if self.selection.sources.is_empty() {
            Source::ALL.to_vec()
        } else {
            self.selection.sources.clone()
        };
        AggregateViews::compute(&self.filtered_records(), &sources)
    }

    // ── Observers ─────────────────────────────────────────────────────────

    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&DashboardEvent) + Send + 'static,
    ) -> SubscriptionId {
        let boxed: Observer = Box::new(observer);
        self.observers.subscribe(boxed)
    }

    /// `false` when `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn set_status(&mut self, status: PipelineStatus) {
        if self.status == status {
            return;
        }
        self.status = status;
        self.observers
            .notify(&DashboardEvent::StatusChanged(self.status.clone()));
    }

    fn selection_changed(&mut self) {
        tracing::debug!(
            years = self.selection.years.len(),
            types = self.selection.types.len(),
            sources = self.selection.sources.len(),
            "selection changed"
        );
        self.observers
            .notify(&DashboardEvent::SelectionChanged(self.selection.clone()));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
