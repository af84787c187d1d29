use serde::Serialize;
use std::collections::BTreeMap;
use wphase_acquisition::{AcquisitionReport, CatalogFailure};
use wphase_core::models::{Catalog, ChannelId, TimeWindow, WaveformBuffer};

/// Output for catalog command
#[derive(Debug, Serialize)]
pub struct CatalogOutput {
    pub inventory: String,
    pub inventory_channels: usize,
    pub catalog_channels: usize,
    pub failures: Vec<CatalogFailure>,
    pub written_to: Option<String>,
}

/// Output for plan command
#[derive(Debug, Serialize)]
pub struct PlanOutput {
    pub catalog_channels: usize,
    pub in_range: usize,
    pub selected: usize,
    pub travel_time_failures: Vec<ChannelId>,
    pub channels: Vec<PlannedChannel>,
}

#[derive(Debug, Serialize)]
pub struct PlannedChannel {
    pub id: ChannelId,
    pub distance_deg: f64,
    pub p_arrival_secs: Option<f64>,
    pub window: TimeWindow,
}

/// Document written by the fetch command
#[derive(Debug, Serialize)]
pub struct FetchDocument<'a> {
    pub waveforms: &'a WaveformBuffer,
    pub metadata: Option<&'a Catalog>,
    pub report: &'a AcquisitionReport,
}

/// Output for fetch command
#[derive(Debug, Serialize)]
pub struct FetchOutput {
    pub server: String,
    pub output: String,
    pub report: AcquisitionReport,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub values: BTreeMap<String, ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub value: String,
    pub source: String,
}
