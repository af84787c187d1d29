//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use std::path::Path;
use wphase_core::config::{AcquisitionConfig, CliConfigOverrides};

/// Load layered configuration: defaults, then file, then environment
pub fn load_config(config_path: Option<&Path>) -> Result<AcquisitionConfig> {
    let mut config = AcquisitionConfig::with_defaults();
    if let Some(path) = config_path {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }
    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides applied last
pub fn load_config_with_overrides(
    config_path: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<AcquisitionConfig> {
    let mut config = load_config(config_path)?;
    config.update_from_cli(overrides);
    config.validate().context("Invalid acquisition configuration")?;
    Ok(config)
}
