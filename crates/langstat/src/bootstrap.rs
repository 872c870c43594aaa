use std::path::{Path, PathBuf};

use langstat_core::models::Source;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure `~/.langstat/` and `~/.langstat/data/` exist.
pub fn ensure_directories() -> anyhow::Result<()> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let app_dir = home.join(".langstat");
    std::fs::create_dir_all(&app_dir)?;
    std::fs::create_dir_all(app_dir.join("data"))?;
    Ok(())
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber, writing to stderr.
///
/// Level names such as `WARNING` are mapped to `EnvFilter` directives; anything
/// unrecognised falls back to `"warn"`.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let upper = log_level.to_uppercase();
    let normalised = match upper.as_str() {
        "DEBUG" => "debug",
        "INFO" => "info",
        "WARNING" => "warn",
        "ERROR" | "CRITICAL" => "error",
        other => other,
    };

    let filter = EnvFilter::try_new(normalised).unwrap_or_else(|_| EnvFilter::new("warn"));

    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry().with(filter).with(layer).init();

    Ok(())
}

// ── Data-directory discovery ───────────────────────────────────────────────────

/// Locate a directory holding the source tables.
///
/// Checks `./dataset/results/` and then `~/.langstat/data/`, returning the
/// first one containing at least one source file.
pub fn discover_data_dir() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    discover_data_dir_in(&cwd, dirs::home_dir().as_deref())
}

fn discover_data_dir_in(cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
    let mut candidates = vec![cwd.join("dataset").join("results")];
    if let Some(home) = home {
        candidates.push(home.join(".langstat").join("data"));
    }
    candidates.into_iter().find(|dir| has_source_file(dir))
}

fn has_source_file(dir: &Path) -> bool {
    Source::ALL
        .iter()
        .any(|source| dir.join(source.file_name()).is_file())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
