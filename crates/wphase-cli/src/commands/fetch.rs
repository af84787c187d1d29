use crate::cli::FetchArgs;
use crate::output::OutputWriter;
use crate::output_types::{FetchDocument, FetchOutput};
use crate::progress::{create_spinner, finish_error, finish_success};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use wphase_acquisition::AcquisitionPipeline;
use wphase_core::config::AcquisitionConfig;
use wphase_core::models::TimeWindows;
use wphase_fdsn::FdsnDataselectClient;
use wphase_geo::DistanceCutoffPruner;

use super::{load_catalog, load_travel_times};

pub async fn execute(args: FetchArgs, config: &AcquisitionConfig, output: &OutputWriter) -> Result<()> {
    let event = args.event.to_event();
    let catalog = load_catalog(&args.inventory, config, output)?;
    let travel_times = load_travel_times(args.travel_times.as_deref())?;
    let windows = args.windows.as_deref().map(read_windows).transpose()?;

    let archive = FdsnDataselectClient::from_config(config);
    let server = archive.base_url().to_string();
    let pipeline = AcquisitionPipeline::new(
        archive,
        travel_times,
        DistanceCutoffPruner::new(config.distance_model.value),
        config.clone(),
    );

    tracing::info!(
        server = %server,
        catalog_channels = catalog.len(),
        injected_windows = windows.is_some(),
        "Starting acquisition"
    );

    let spinner =
        create_spinner(&format!("Fetching waveforms from {}...", server), output.is_json());
    let result = pipeline.run(&event, &catalog, windows).await;
    let report = &result.report;

    if report.fetch.requested > 0 && report.fetch.failed_chunks == report.fetch.chunks {
        finish_error(&spinner, "Every bulk request failed");
    } else {
        finish_success(&spinner, &format!("{} trace(s) delivered", report.delivered));
    }

    let document = FetchDocument {
        waveforms: &result.waveforms,
        metadata: result.metadata.as_ref(),
        report,
    };
    let json = serde_json::to_string(&document)?;
    fs::write(&args.output, json)
        .with_context(|| format!("Failed to write waveforms to {}", args.output.display()))?;

    if output.is_json() {
        output.result(FetchOutput {
            server,
            output: args.output.display().to_string(),
            report: report.clone(),
        })?;
        return Ok(());
    }

    output.section("Acquisition Summary");
    output.kv("Server", &server);
    output.kv("Catalog channels", report.catalog_channels);
    output.kv("Within distance range", report.in_range);
    output.kv("Windows planned", report.planned);
    output.kv("After pruning", report.after_pruning);
    output.kv("Requested", report.fetch.requested);
    output.kv("Traces received", report.fetch.traces);
    output.kv("After deduplication", report.after_dedup);
    output.kv("Delivered", report.delivered);

    if report.fetch.failed_chunks > 0 {
        output.error(format!(
            "{} of {} bulk request(s) failed",
            report.fetch.failed_chunks, report.fetch.chunks
        ));
    }
    if report.fetch.incomplete > 0 {
        output.warning(format!(
            "{} channel(s) skipped because their window has not ended",
            report.fetch.incomplete
        ));
    }
    if !report.ambiguous.is_empty() {
        output.warning(format!("{} gappy channel(s) removed", report.ambiguous.len()));
    }
    if !report.unsupported_rate.is_empty() {
        output.warning(format!(
            "{} channel(s) dropped for an unsupported sampling rate",
            report.unsupported_rate.len()
        ));
    }

    output.success(format!("Waveforms written to {}", args.output.display()));

    Ok(())
}

/// Read precomputed request windows from a JSON file
fn read_windows(path: &Path) -> Result<TimeWindows> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read windows file {}", path.display()))?;
    let windows: TimeWindows = serde_json::from_str(&content)
        .with_context(|| format!("Invalid windows file {}", path.display()))?;
    Ok(windows)
}
