use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use wphase_core::error::{Result, WphaseError};
use wphase_core::models::{
    Catalog, ChannelId, ChannelMetadata, EarthquakeInfo, ResponseDescriptor, TimeWindow, Trace,
    TransferFunction,
};
use wphase_core::ports::{BulkRequestLine, TravelTimeModel, WaveformArchive};

pub fn id(s: &str) -> ChannelId {
    ChannelId::parse(s).unwrap()
}

pub fn metadata_at(latitude: f64, longitude: f64) -> ChannelMetadata {
    ChannelMetadata {
        latitude,
        longitude,
        elevation: 0.0,
        azimuth: 0.0,
        dip: -90.0,
        sampling_rate: 20.0,
        response: ResponseDescriptor {
            poles: Vec::new(),
            zeros: Vec::new(),
            gain: 1.0,
            sensitivity: 1.0,
            transfer_function: TransferFunction::LaplaceRadians,
        },
        p_arrival: None,
    }
}

pub fn catalog(entries: &[(&str, f64, f64)]) -> Catalog {
    entries.iter().map(|(s, lat, lon)| (id(s), metadata_at(*lat, *lon))).collect()
}

pub fn origin() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 3, 4, 19, 28, 33).unwrap()
}

pub fn event_at(latitude: f64, longitude: f64, depth: f64) -> EarthquakeInfo {
    EarthquakeInfo::new(latitude, longitude, depth, origin())
}

pub fn window_from(start: DateTime<Utc>, length_secs: i64) -> TimeWindow {
    TimeWindow::new(start, start + chrono::Duration::seconds(length_secs))
}

pub fn trace(s: &str, rate: f64, n: usize) -> Trace {
    Trace::new(id(s), rate, origin(), vec![0.0; n])
}

/// P time proportional to distance
pub struct LinearTravelTimes(pub f64);

impl TravelTimeModel for LinearTravelTimes {
    fn p_time(&self, distance_deg: f64, _depth_km: f64) -> Result<f64> {
        Ok(self.0 * distance_deg)
    }
}

/// Archive answering each request line with one short 20 Hz trace
pub struct MockArchive {
    pub calls: AtomicUsize,
    sizes: Mutex<Vec<usize>>,
    fail_for: Vec<String>,
    delay: Option<Duration>,
}

impl MockArchive {
    pub fn echo() -> Self {
        Self { calls: AtomicUsize::new(0), sizes: Mutex::new(Vec::new()), fail_for: Vec::new(), delay: None }
    }

    /// Fail any chunk that contains one of these stations
    pub fn failing_for(stations: &[&str]) -> Self {
        Self { fail_for: stations.iter().map(|s| s.to_string()).collect(), ..Self::echo() }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl WaveformArchive for MockArchive {
    async fn fetch_bulk(&self, lines: &[BulkRequestLine]) -> Result<Vec<Trace>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sizes.lock().unwrap().push(lines.len());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if lines.iter().any(|l| self.fail_for.contains(&l.station)) {
            return Err(WphaseError::RemoteFetch {
                endpoint: self.endpoint().to_string(),
                reason: "HTTP 503".to_string(),
            });
        }

        Ok(lines
            .iter()
            .map(|l| {
                let id = ChannelId::new(&l.network, &l.station, &l.location, &l.channel).unwrap();
                Trace::new(id, 20.0, l.start, vec![0.0; 10])
            })
            .collect())
    }

    fn endpoint(&self) -> &str {
        "mock://archive"
    }
}
