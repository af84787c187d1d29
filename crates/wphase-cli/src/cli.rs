use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use wphase_core::config::{parse_dist_range, parse_distance_model, CliConfigOverrides};
use wphase_core::models::{DistanceModel, EarthquakeInfo};

/// W-phase waveform acquisition
#[derive(Parser, Debug)]
#[command(name = "wphase")]
#[command(about = "Waveform acquisition for W-phase inversion", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the channel catalog from a StationXML inventory
    Catalog(CatalogArgs),

    /// Select channels and plan request windows without fetching
    Plan(PlanArgs),

    /// Run the full acquisition against the configured FDSN server
    Fetch(FetchArgs),

    /// Show every configuration value and where it came from
    Config,
}

/// Acquisition settings that override file and environment configuration
#[derive(Args, Debug, Default)]
pub struct OverrideArgs {
    /// FDSN data centre base URL
    #[arg(long, global = true, value_name = "URL")]
    pub server: Option<String>,

    /// W-phase window length factor (seconds per degree)
    #[arg(long, global = true)]
    pub wp_tw_factor: Option<f64>,

    /// Seconds requested before the P arrival
    #[arg(long, global = true)]
    pub t_before_p: Option<f64>,

    /// Seconds requested after the W-phase window
    #[arg(long, global = true)]
    pub t_after_wp: Option<f64>,

    /// Epicentral distance range in degrees, as MIN,MAX
    #[arg(long, global = true, value_name = "MIN,MAX", value_parser = dist_range_arg)]
    pub dist_range: Option<(f64, f64)>,

    /// Channels per bulk request
    #[arg(long, global = true)]
    pub bulk_chunk_len: Option<usize>,

    /// Pruning cutoff schedule in degrees
    #[arg(long, global = true, value_delimiter = ',', value_name = "DEG,...")]
    pub prune_cutoffs: Option<Vec<f64>>,

    /// Disable station pruning
    #[arg(long, global = true)]
    pub no_prune: bool,

    /// Keep native sampling rates
    #[arg(long, global = true)]
    pub no_decimate: bool,

    /// Drop channels whose window ends in the future
    #[arg(long, global = true)]
    pub reject_incomplete: bool,

    /// Bulk requests in flight at once
    #[arg(long, global = true)]
    pub max_concurrent_requests: Option<usize>,

    /// Per-request timeout in seconds (0 disables)
    #[arg(long, global = true)]
    pub request_timeout_secs: Option<u64>,

    /// Distance model (ellipsoidal or spherical)
    #[arg(long, global = true, value_parser = distance_model_arg)]
    pub distance_model: Option<DistanceModel>,
}

impl OverrideArgs {
    pub fn into_overrides(self) -> CliConfigOverrides {
        CliConfigOverrides {
            server: self.server,
            wp_tw_factor: self.wp_tw_factor,
            t_before_p: self.t_before_p,
            t_after_wp: self.t_after_wp,
            dist_range: self.dist_range,
            bulk_chunk_len: self.bulk_chunk_len,
            prune_cutoffs: self.prune_cutoffs,
            no_prune: self.no_prune,
            no_decimate: self.no_decimate,
            reject_incomplete: self.reject_incomplete,
            max_concurrent_requests: self.max_concurrent_requests,
            request_timeout_secs: self.request_timeout_secs,
            distance_model: self.distance_model,
        }
    }
}

fn dist_range_arg(s: &str) -> Result<(f64, f64), String> {
    parse_dist_range(s).map_err(|e| e.to_string())
}

fn distance_model_arg(s: &str) -> Result<DistanceModel, String> {
    parse_distance_model(s).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
pub struct CatalogArgs {
    /// StationXML inventory file
    #[arg(long, short = 'i', value_name = "FILE")]
    pub inventory: PathBuf,

    /// Write the catalog as JSON to this file
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Hypocentre of the event
#[derive(Args, Debug)]
pub struct EventArgs {
    /// Epicentre latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Epicentre longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Depth in kilometres
    #[arg(long)]
    pub depth: f64,

    /// Origin time (RFC 3339, e.g. 2021-03-04T19:28:33Z)
    #[arg(long)]
    pub time: DateTime<Utc>,
}

impl EventArgs {
    pub fn to_event(&self) -> EarthquakeInfo {
        EarthquakeInfo::new(self.lat, self.lon, self.depth, self.time)
    }
}

#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// StationXML inventory file
    #[arg(long, short = 'i', value_name = "FILE")]
    pub inventory: PathBuf,

    #[command(flatten)]
    pub event: EventArgs,

    /// Travel-time table (JSON); the built-in table is used otherwise
    #[arg(long, value_name = "FILE")]
    pub travel_times: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// StationXML inventory file
    #[arg(long, short = 'i', value_name = "FILE")]
    pub inventory: PathBuf,

    #[command(flatten)]
    pub event: EventArgs,

    /// Travel-time table (JSON); the built-in table is used otherwise
    #[arg(long, value_name = "FILE")]
    pub travel_times: Option<PathBuf>,

    /// Precomputed request windows (JSON map of channel id to start/end)
    #[arg(long, value_name = "FILE")]
    pub windows: Option<PathBuf>,

    /// Where to write waveforms, metadata and report as JSON
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: PathBuf,
}
