//! Shared types for the language-usage statistics pipeline: the record model,
//! error taxonomy, CLI settings, display labels and the preference port.

pub mod error;
pub mod formatting;
pub mod labels;
pub mod models;
pub mod preferences;
pub mod settings;

pub use error::{Result, StatsError};
