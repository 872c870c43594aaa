//! Runtime layer for langstat.
//!
//! Holds the pipeline state between loads, applies filter mutations, and
//! notifies registered observers of every change.

pub mod dashboard;
pub mod events;

pub use langstat_core as core;
pub use langstat_data as data;
