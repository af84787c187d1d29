use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use wphase_core::models::{Catalog, ChannelId, TimeWindows, WaveformBuffer};

use crate::fetch::FetchReport;

/// Channels selected for retrieval together with their request windows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquisitionPlan {
    /// Channels to request, in catalog order
    pub channels: Vec<ChannelId>,
    /// Epicentral distance in degrees of every channel within range
    pub distances: BTreeMap<ChannelId, f64>,
    pub windows: TimeWindows,
    /// Catalog entries of in-range channels annotated with their P arrival
    pub annotated: Catalog,
    pub travel_time_failures: Vec<ChannelId>,
}

/// Channel counts after each stage and the ids dropped along the way
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquisitionReport {
    pub catalog_channels: usize,
    pub in_range: usize,
    pub planned: usize,
    pub after_pruning: usize,
    pub fetch: FetchReport,
    pub after_dedup: usize,
    pub delivered: usize,
    pub travel_time_failures: Vec<ChannelId>,
    pub ambiguous: Vec<ChannelId>,
    pub unsupported_rate: Vec<ChannelId>,
}

/// Result of a full acquisition run
#[derive(Debug, Clone, Default)]
pub struct AcquisitionOutput {
    pub waveforms: WaveformBuffer,
    /// Arrival-annotated metadata, present when P times were requested
    pub metadata: Option<Catalog>,
    pub report: AcquisitionReport,
}
