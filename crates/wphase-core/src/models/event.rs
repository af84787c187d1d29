use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::channel::ChannelId;

/// Hypocentre and origin time of the event being processed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeInfo {
    pub latitude: f64,
    pub longitude: f64,
    /// Depth in kilometres
    pub depth: f64,
    pub origin_time: DateTime<Utc>,
}

impl EarthquakeInfo {
    pub fn new(latitude: f64, longitude: f64, depth: f64, origin_time: DateTime<Utc>) -> Self {
        Self { latitude, longitude, depth, origin_time }
    }
}

/// Waveform request window for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window length in seconds
    pub fn duration_secs(&self) -> f64 {
        (self.end - self.start).num_microseconds().unwrap_or(i64::MAX) as f64 / 1e6
    }
}

/// Request windows keyed by channel id
pub type TimeWindows = BTreeMap<ChannelId, TimeWindow>;

/// Convert fractional seconds to a chrono duration at microsecond resolution
pub fn duration_from_secs(seconds: f64) -> Duration {
    Duration::microseconds((seconds * 1e6).round() as i64)
}
