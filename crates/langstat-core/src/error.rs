use crate::models::Source;
use thiserror::Error;

/// All errors produced by the language-statistics pipeline.
#[derive(Error, Debug)]
pub enum StatsError {
    /// One of the three source fetches failed; the load fails as a unit.
    #[error("Failed to fetch {origin} data: {reason}")]
    Fetch { origin: Source, reason: String },

    /// A source's header row lacks a required column.
    #[error("Missing column '{column}' in {origin} data")]
    MissingColumn { origin: Source, column: String },

    /// The header row itself could not be read.
    #[error("Unreadable header in {origin} data: {reason}")]
    Header { origin: Source, reason: String },

    /// The load outcome belongs to a request that a newer one replaced.
    #[error("Load {generation} was superseded by a newer request")]
    Superseded { generation: u64 },

    /// A fetch task panicked or was cancelled.
    #[error("Fetch task failed: {0}")]
    Task(String),

    /// The preference store could not be read or written.
    #[error("Preference store error: {0}")]
    Preference(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StatsError {
    /// `true` for errors that terminate a load attempt.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            StatsError::Fetch { .. }
                | StatsError::MissingColumn { .. }
                | StatsError::Header { .. }
                | StatsError::Task(_)
        )
    }
}

/// Convenience alias used throughout the langstat crates.
pub type Result<T> = std::result::Result<T, StatsError>;
