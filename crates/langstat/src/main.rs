mod bootstrap;
mod output;

use std::time::Duration;

use anyhow::{anyhow, Result};
use langstat_core::settings::Settings;
use langstat_data::loader::{FsFetcher, HttpFetcher, Loader, SourceFetcher};
use langstat_data::normalizer::ColumnLayout;
use langstat_runtime::dashboard::Dashboard;

use crate::output::{OutputFormat, View};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("langstat v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Layout: {}, View: {}, Format: {}, Locale: {}",
        settings.layout,
        settings.view,
        settings.format,
        settings.locale
    );

    let layout = ColumnLayout::by_name(&settings.layout)
        .ok_or_else(|| anyhow!("unknown column layout '{}'", settings.layout))?;

    if let Some(base_url) = &settings.base_url {
        let fetcher =
            HttpFetcher::with_timeout(base_url, Duration::from_secs(settings.timeout_secs))?;
        tracing::info!("Fetching sources from {}", base_url);
        return run(Loader::new(fetcher, layout), &settings).await;
    }

    let data_dir = settings
        .data_dir
        .clone()
        .or_else(bootstrap::discover_data_dir)
        .ok_or_else(|| {
            anyhow!("no data directory found; pass --data-dir or --base-url, or place the tables in ./dataset/results")
        })?;
    tracing::info!("Reading sources from {}", data_dir.display());
    run(Loader::new(FsFetcher::new(data_dir), layout), &settings).await
}

/// Load once, apply the CLI filters and print the requested views.
async fn run<F: SourceFetcher>(loader: Loader<F>, settings: &Settings) -> Result<()> {
    let view: View = settings.view.parse().map_err(|e: String| anyhow!(e))?;
    let format: OutputFormat = settings.format.parse().map_err(|e: String| anyhow!(e))?;
    let locale = settings.locale();

    let mut dashboard = Dashboard::new(loader);
    let request = dashboard.begin_load();

    // Dropping the request on Ctrl+C aborts the outstanding fetch tasks.
    let outcome = tokio::select! {
        outcome = request.run() => outcome,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; abandoning load");
            return Ok(());
        }
    };
    let report = dashboard.apply(outcome)?;

    dashboard.set_filter(
        settings.years.iter().copied(),
        settings.selected_types(),
        settings.selected_sources(),
    );
    let views = dashboard.views();

    match format {
        OutputFormat::Table => {
            println!("{}", output::render_selection(dashboard.selection(), locale));
            println!();
            println!("{}", output::render_tables(&views, view, locale));
        }
        OutputFormat::Json => println!(
            "{}",
            output::render_json(&views, view, &report, dashboard.selection())?
        ),
    }

    if !report.diagnostics.is_empty() {
        eprintln!();
        eprintln!("{}", output::render_diagnostics(&report.diagnostics, locale));
    }

    Ok(())
}
