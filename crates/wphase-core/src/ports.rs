//! Port trait definitions
//!
//! These traits define the collaborators the acquisition pipeline depends on.
//! Adapters live in the `wphase-geo`, `wphase-acquisition` and `wphase-fdsn` crates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Catalog, ChannelId, TimeWindow, Trace};

/// Port for P-wave travel time lookup
pub trait TravelTimeModel: Send + Sync {
    /// P travel time in seconds for an epicentral distance (degrees) and source depth (km)
    fn p_time(&self, distance_deg: f64, depth_km: f64) -> Result<f64>;
}

/// Port for coordinate-based station thinning
pub trait StationPruning: Send + Sync {
    /// Reduce a one-channel-per-station list using a schedule of minimum separations (degrees).
    ///
    /// Implementations read only coordinates from `catalog`, so any channel of a
    /// station is an equivalent stand-in for it.
    fn prune(&self, catalog: &Catalog, stations: &[ChannelId], cutoffs: &[f64]) -> Vec<ChannelId>;
}

/// One line of a bulk time series request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkRequestLine {
    pub network: String,
    pub station: String,
    pub location: String,
    pub channel: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BulkRequestLine {
    pub fn new(id: &ChannelId, window: &TimeWindow) -> Self {
        Self {
            network: id.network().to_string(),
            station: id.station().to_string(),
            location: id.location().to_string(),
            channel: id.channel().to_string(),
            start: window.start,
            end: window.end,
        }
    }
}

/// Port for a remote waveform archive
#[async_trait]
pub trait WaveformArchive: Send + Sync {
    /// Fetch every segment covering the requested lines.
    ///
    /// `Ok(vec![])` means the archive holds no data; failures are `Err`.
    async fn fetch_bulk(&self, lines: &[BulkRequestLine]) -> Result<Vec<Trace>>;

    /// Endpoint description used in log messages
    fn endpoint(&self) -> &str;
}

/// Port for a decimation routine producing 1 Hz output
pub trait Decimate: Send + Sync {
    fn decimate(&self, trace: &Trace) -> Trace;
}

impl<F> Decimate for F
where
    F: Fn(&Trace) -> Trace + Send + Sync,
{
    fn decimate(&self, trace: &Trace) -> Trace {
        self(trace)
    }
}
