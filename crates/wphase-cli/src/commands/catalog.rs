use crate::cli::CatalogArgs;
use crate::output::OutputWriter;
use crate::output_types::CatalogOutput;
use crate::progress::{create_spinner, finish_success};
use anyhow::{Context, Result};
use std::fs;
use tabled::Tabled;
use wphase_acquisition::build_catalog;
use wphase_core::config::AcquisitionConfig;
use wphase_fdsn::read_inventory;

#[derive(Tabled)]
struct FailureRow {
    #[tabled(rename = "Channel")]
    id: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

pub fn execute(args: CatalogArgs, config: &AcquisitionConfig, output: &OutputWriter) -> Result<()> {
    let spinner = create_spinner("Reading inventory...", output.is_json());
    let inventory = read_inventory(&args.inventory)
        .with_context(|| format!("Failed to read inventory {}", args.inventory.display()))?;

    spinner.set_message("Extracting channel metadata...");
    let build = build_catalog(&inventory, &config.catalog_filters());
    finish_success(&spinner, &format!("{} channel(s) catalogued", build.catalog.len()));

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&build.catalog)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write catalog to {}", path.display()))?;
    }

    if output.is_json() {
        output.result(CatalogOutput {
            inventory: args.inventory.display().to_string(),
            inventory_channels: inventory.channel_count(),
            catalog_channels: build.catalog.len(),
            failures: build.failures,
            written_to: args.output.as_ref().map(|p| p.display().to_string()),
        })?;
        return Ok(());
    }

    output.section("Catalog");
    output.kv("Inventory", args.inventory.display());
    output.kv("Inventory channels", inventory.channel_count());
    output.kv("Catalog channels", build.catalog.len());

    if !build.failures.is_empty() {
        output.section("Skipped Channels");
        output.table(
            build
                .failures
                .into_iter()
                .map(|f| FailureRow { id: f.id, reason: f.reason })
                .collect(),
        );
    }

    if let Some(path) = &args.output {
        output.success(format!("Catalog written to {}", path.display()));
    }

    Ok(())
}
