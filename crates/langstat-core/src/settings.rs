use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use crate::labels::Locale;
use crate::models::{RecordType, Source};
use crate::preferences::{JsonFileStore, PreferenceStore, LOCALE_KEY};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Tuvan and Russian language-usage statistics across three media sources
#[derive(Parser, Debug, Clone)]
#[command(
    name = "langstat",
    about = "Tuvan and Russian language-usage statistics across three media sources",
    version
)]
pub struct Settings {
    /// Directory holding the three results CSV files
    #[arg(long, conflicts_with = "base_url")]
    pub data_dir: Option<PathBuf>,

    /// Base URL serving the three results CSV files
    #[arg(long)]
    pub base_url: Option<String>,

    /// Header naming of the CSV files
    #[arg(long, default_value = "ru", value_parser = ["ru", "en"])]
    pub layout: String,

    /// Restrict to a year (repeatable; none means all years)
    #[arg(long = "year")]
    pub years: Vec<i32>,

    /// Restrict to a record type label (repeatable; none means all types)
    #[arg(long = "type")]
    pub types: Vec<String>,

    /// Restrict to a source (repeatable, order is kept for the stacked view)
    #[arg(long = "source", value_parser = ["community", "government", "official"])]
    pub sources: Vec<String>,

    /// Which aggregate view to print
    #[arg(long, default_value = "all", value_parser = ["all", "summary", "percent", "counts", "stacked", "distribution"])]
    pub view: String,

    /// Output format
    #[arg(long, default_value = "table", value_parser = ["table", "json"])]
    pub format: String,

    /// Display language for labels
    #[arg(long, default_value = "ru", value_parser = ["ru", "en"])]
    pub locale: String,

    /// HTTP request timeout in seconds (only with --base-url)
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout_secs: u64,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear the saved locale preference
    #[arg(long)]
    pub clear: bool,
}

impl Settings {
    /// Parse CLI arguments and merge the stored locale preference from the
    /// default preference file.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &JsonFileStore::default_location(),
        )
    }

    /// Full implementation, taking the argument list and store explicitly so
    /// tests can redirect both.
    ///
    /// An explicit `--locale` always wins; otherwise the stored preference is
    /// used. The resolved locale is written back unless `--clear` was given,
    /// in which case the stored preference is removed.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        store: &dyn PreferenceStore,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        if settings.clear {
            if let Err(e) = store.remove(LOCALE_KEY) {
                tracing::warn!(error = %e, "failed to clear locale preference");
            }
            return settings;
        }

        if !is_arg_explicitly_set(&matches, "locale") {
            if let Some(stored) = store.get(LOCALE_KEY) {
                if stored.parse::<Locale>().is_ok() {
                    settings.locale = stored;
                }
            }
        }

        if let Err(e) = store.set(LOCALE_KEY, &settings.locale) {
            tracing::warn!(error = %e, "failed to persist locale preference");
        }

        settings
    }

    /// Resolved display locale.
    pub fn locale(&self) -> Locale {
        self.locale.parse().unwrap_or_default()
    }

    /// Selected sources, de-duplicated, in the order given.
    pub fn selected_sources(&self) -> Vec<Source> {
        let mut out = Vec::new();
        for source in self.sources.iter().filter_map(|s| s.parse::<Source>().ok()) {
            if !out.contains(&source) {
                out.push(source);
            }
        }
        out
    }

    /// Selected record types, canonicalised like input labels.
    pub fn selected_types(&self) -> Vec<RecordType> {
        self.types.iter().map(|t| RecordType::from_label(t)).collect()
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
