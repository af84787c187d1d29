//! Command implementations

mod catalog;
mod config;
mod fetch;
mod plan;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use std::path::Path;
use wphase_acquisition::TabulatedTravelTimes;
use wphase_core::config::AcquisitionConfig;
use wphase_core::models::Catalog;
use wphase_fdsn::read_inventory;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config_with_overrides(cli.config.as_deref(), cli.overrides.into_overrides())?;

    match cli.command {
        Commands::Catalog(args) => catalog::execute(args, &config, &output),
        Commands::Plan(args) => plan::execute(args, &config, &output),
        Commands::Fetch(args) => fetch::execute(args, &config, &output).await,
        Commands::Config => config::execute(&config, &output),
    }
}

/// Read an inventory and build its catalog, warning about dropped channels
fn load_catalog(path: &Path, config: &AcquisitionConfig, output: &OutputWriter) -> Result<Catalog> {
    let inventory = read_inventory(path)
        .with_context(|| format!("Failed to read inventory {}", path.display()))?;
    let build = wphase_acquisition::build_catalog(&inventory, &config.catalog_filters());

    if !build.failures.is_empty() {
        output.warning(format!(
            "{} channel(s) skipped for incomplete metadata",
            build.failures.len()
        ));
    }

    Ok(build.catalog)
}

/// Load a travel-time table from disk, or fall back to the built-in one
fn load_travel_times(path: Option<&Path>) -> Result<TabulatedTravelTimes> {
    match path {
        Some(path) => TabulatedTravelTimes::load(path)
            .with_context(|| format!("Failed to load travel-time table {}", path.display())),
        None => Ok(TabulatedTravelTimes::builtin()),
    }
}
