//! Data layer for langstat.
//!
//! Fetches the three per-source CSV tables, normalizes their rows into typed
//! records, holds the current record set, and computes filter subsets and the
//! aggregate views drawn from them.

pub mod aggregator;
pub mod filter;
pub mod loader;
pub mod normalizer;
pub mod repository;

pub use langstat_core as core;
