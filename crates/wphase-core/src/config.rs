use crate::error::{Result, WphaseError};
use crate::models::DistanceModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Channel filters applied while building the metadata catalog.
///
/// `None` disables a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogFilters {
    pub sampling_rates: Option<Vec<f64>>,
    /// Band + instrument codes, i.e. the channel code without its component letter
    pub channel_codes: Option<Vec<String>>,
    pub location_codes: Option<Vec<String>>,
}

impl Default for CatalogFilters {
    fn default() -> Self {
        Self {
            sampling_rates: Some(vec![1.0, 20.0, 40.0, 50.0]),
            channel_codes: Some(vec!["BH".to_string(), "LH".to_string()]),
            location_codes: None,
        }
    }
}

impl CatalogFilters {
    /// Filters that accept every channel
    pub fn none() -> Self {
        Self { sampling_rates: None, channel_codes: None, location_codes: None }
    }
}

/// Parameters of the request window around the P arrival
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowParams {
    /// Window length factor: seconds of W-phase per degree of distance
    pub wp_tw_factor: f64,
    /// Seconds requested before the P arrival
    pub t_before_p: f64,
    /// Seconds requested after the W-phase window ends
    pub t_after_wp: f64,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self { wp_tw_factor: 15.0, t_before_p: 1500.0, t_after_wp: 60.0 }
    }
}

/// Layered configuration for one acquisition run
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    pub server: ConfigValue<String>,
    pub wp_tw_factor: ConfigValue<f64>,
    pub t_before_p: ConfigValue<f64>,
    pub t_after_wp: ConfigValue<f64>,
    pub dist_range: ConfigValue<(f64, f64)>,
    pub add_ptime: ConfigValue<bool>,
    pub bulk_chunk_len: ConfigValue<usize>,
    pub prune_cutoffs: ConfigValue<Option<Vec<f64>>>,
    pub decimate: ConfigValue<bool>,
    pub reject_incomplete: ConfigValue<bool>,
    pub max_concurrent_requests: ConfigValue<usize>,
    pub request_timeout_secs: ConfigValue<u64>,
    pub distance_model: ConfigValue<DistanceModel>,
    pub sampling_rates: ConfigValue<Option<Vec<f64>>>,
    pub channel_codes: ConfigValue<Option<Vec<String>>>,
    pub location_codes: ConfigValue<Option<Vec<String>>>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl AcquisitionConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let window = WindowParams::default();
        let filters = CatalogFilters::default();
        Self {
            server: ConfigValue::new("http://service.iris.edu".to_string(), ConfigSource::Default),
            wp_tw_factor: ConfigValue::new(window.wp_tw_factor, ConfigSource::Default),
            t_before_p: ConfigValue::new(window.t_before_p, ConfigSource::Default),
            t_after_wp: ConfigValue::new(window.t_after_wp, ConfigSource::Default),
            dist_range: ConfigValue::new((5.0, 90.0), ConfigSource::Default),
            add_ptime: ConfigValue::new(true, ConfigSource::Default),
            bulk_chunk_len: ConfigValue::new(200, ConfigSource::Default),
            prune_cutoffs: ConfigValue::new(
                Some(vec![1.0, 2.0, 3.0, 4.0, 5.0, 5.0]),
                ConfigSource::Default,
            ),
            decimate: ConfigValue::new(true, ConfigSource::Default),
            reject_incomplete: ConfigValue::new(false, ConfigSource::Default),
            max_concurrent_requests: ConfigValue::new(4, ConfigSource::Default),
            request_timeout_secs: ConfigValue::new(120, ConfigSource::Default),
            distance_model: ConfigValue::new(DistanceModel::Ellipsoidal, ConfigSource::Default),
            sampling_rates: ConfigValue::new(filters.sampling_rates, ConfigSource::Default),
            channel_codes: ConfigValue::new(filters.channel_codes, ConfigSource::Default),
            location_codes: ConfigValue::new(filters.location_codes, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| WphaseError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| WphaseError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        let src = ConfigSource::File;
        if let Some(server) = file_config.server {
            self.server.update(server, src);
        }
        if let Some(v) = file_config.wp_tw_factor {
            self.wp_tw_factor.update(v, src);
        }
        if let Some(v) = file_config.t_before_p {
            self.t_before_p.update(v, src);
        }
        if let Some(v) = file_config.t_after_wp {
            self.t_after_wp.update(v, src);
        }
        if let Some([min, max]) = file_config.dist_range {
            self.dist_range.update((min, max), src);
        }
        if let Some(v) = file_config.add_ptime {
            self.add_ptime.update(v, src);
        }
        if let Some(v) = file_config.bulk_chunk_len {
            self.bulk_chunk_len.update(v, src);
        }
        if let Some(cutoffs) = file_config.prune_cutoffs {
            // An empty schedule disables pruning
            self.prune_cutoffs.update(non_empty(cutoffs), src);
        }
        if let Some(v) = file_config.decimate {
            self.decimate.update(v, src);
        }
        if let Some(v) = file_config.reject_incomplete {
            self.reject_incomplete.update(v, src);
        }
        if let Some(v) = file_config.max_concurrent_requests {
            self.max_concurrent_requests.update(v, src);
        }
        if let Some(v) = file_config.request_timeout_secs {
            self.request_timeout_secs.update(v, src);
        }
        if let Some(v) = file_config.distance_model {
            self.distance_model.update(v, src);
        }
        if let Some(rates) = file_config.sampling_rates {
            self.sampling_rates.update(non_empty(rates), src);
        }
        if let Some(codes) = file_config.channel_codes {
            self.channel_codes.update(non_empty(codes), src);
        }
        if let Some(locs) = file_config.location_codes {
            self.location_codes.update(non_empty(locs), src);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        let src = ConfigSource::Environment;

        // WPHASE_SERVER
        if let Ok(server) = env::var("WPHASE_SERVER") {
            self.server.update(server, src);
        }

        if let Some(v) = env_parsed("WPHASE_WP_TW_FACTOR", parse_f64) {
            self.wp_tw_factor.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_T_BEFORE_P", parse_f64) {
            self.t_before_p.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_T_AFTER_WP", parse_f64) {
            self.t_after_wp.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_DIST_RANGE", parse_dist_range) {
            self.dist_range.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_ADD_PTIME", parse_bool) {
            self.add_ptime.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_BULK_CHUNK_LEN", parse_usize) {
            self.bulk_chunk_len.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_PRUNE_CUTOFFS", parse_optional_f64_list) {
            self.prune_cutoffs.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_DECIMATE", parse_bool) {
            self.decimate.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_REJECT_INCOMPLETE", parse_bool) {
            self.reject_incomplete.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_MAX_CONCURRENT_REQUESTS", parse_usize) {
            self.max_concurrent_requests.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_REQUEST_TIMEOUT_SECS", |s| {
            parse_usize(s).map(|n| n as u64)
        }) {
            self.request_timeout_secs.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_DISTANCE_MODEL", parse_distance_model) {
            self.distance_model.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_SAMPLING_RATES", parse_optional_f64_list) {
            self.sampling_rates.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_CHANNEL_CODES", |s| Ok(parse_optional_code_list(s))) {
            self.channel_codes.update(v, src);
        }
        if let Some(v) = env_parsed("WPHASE_LOCATION_CODES", |s| Ok(parse_optional_code_list(s))) {
            self.location_codes.update(v, src);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        let src = ConfigSource::Cli;
        if let Some(server) = overrides.server {
            self.server.update(server, src);
        }
        if let Some(v) = overrides.wp_tw_factor {
            self.wp_tw_factor.update(v, src);
        }
        if let Some(v) = overrides.t_before_p {
            self.t_before_p.update(v, src);
        }
        if let Some(v) = overrides.t_after_wp {
            self.t_after_wp.update(v, src);
        }
        if let Some(v) = overrides.dist_range {
            self.dist_range.update(v, src);
        }
        if let Some(v) = overrides.bulk_chunk_len {
            self.bulk_chunk_len.update(v, src);
        }
        if overrides.no_prune {
            self.prune_cutoffs.update(None, src);
        } else if let Some(cutoffs) = overrides.prune_cutoffs {
            self.prune_cutoffs.update(non_empty(cutoffs), src);
        }
        if overrides.no_decimate {
            self.decimate.update(false, src);
        }
        if overrides.reject_incomplete {
            self.reject_incomplete.update(true, src);
        }
        if let Some(v) = overrides.max_concurrent_requests {
            self.max_concurrent_requests.update(v, src);
        }
        if let Some(v) = overrides.request_timeout_secs {
            self.request_timeout_secs.update(v, src);
        }
        if let Some(v) = overrides.distance_model {
            self.distance_model.update(v, src);
        }
    }

    /// Check values that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.server.value.trim().is_empty() {
            return Err(WphaseError::ConfigMissing { key: "server".to_string() });
        }
        if self.bulk_chunk_len.value == 0 {
            return Err(invalid("bulk_chunk_len", "must be at least 1"));
        }
        if self.max_concurrent_requests.value == 0 {
            return Err(invalid("max_concurrent_requests", "must be at least 1"));
        }
        let (min, max) = self.dist_range.value;
        if !(min.is_finite() && max.is_finite()) || min < 0.0 || min > max || max > 180.0 {
            return Err(invalid(
                "dist_range",
                &format!("expected 0 <= min <= max <= 180, got ({}, {})", min, max),
            ));
        }
        for (key, v) in [
            ("wp_tw_factor", self.wp_tw_factor.value),
            ("t_before_p", self.t_before_p.value),
            ("t_after_wp", self.t_after_wp.value),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(invalid(key, "must be a non-negative number"));
            }
        }
        if let Some(cutoffs) = &self.prune_cutoffs.value {
            if cutoffs.iter().any(|c| !c.is_finite() || *c <= 0.0) {
                return Err(invalid("prune_cutoffs", "cutoffs must be positive"));
            }
        }
        Ok(())
    }

    /// Catalog filters assembled from the current values
    pub fn catalog_filters(&self) -> CatalogFilters {
        CatalogFilters {
            sampling_rates: self.sampling_rates.value.clone(),
            channel_codes: self.channel_codes.value.clone(),
            location_codes: self.location_codes.value.clone(),
        }
    }

    /// Window parameters assembled from the current values
    pub fn window_params(&self) -> WindowParams {
        WindowParams {
            wp_tw_factor: self.wp_tw_factor.value,
            t_before_p: self.t_before_p.value,
            t_after_wp: self.t_after_wp.value,
        }
    }

    /// Per-request timeout, `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs.value {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut map = BTreeMap::new();
        let mut put = |key: &str, value: String, source: ConfigSource| {
            map.insert(key.to_string(), (value, source));
        };

        put("server", self.server.value.clone(), self.server.source);
        put("wp_tw_factor", self.wp_tw_factor.value.to_string(), self.wp_tw_factor.source);
        put("t_before_p", self.t_before_p.value.to_string(), self.t_before_p.source);
        put("t_after_wp", self.t_after_wp.value.to_string(), self.t_after_wp.source);
        put(
            "dist_range",
            format!("{},{}", self.dist_range.value.0, self.dist_range.value.1),
            self.dist_range.source,
        );
        put("add_ptime", self.add_ptime.value.to_string(), self.add_ptime.source);
        put("bulk_chunk_len", self.bulk_chunk_len.value.to_string(), self.bulk_chunk_len.source);
        put(
            "prune_cutoffs",
            format_optional_list(&self.prune_cutoffs.value),
            self.prune_cutoffs.source,
        );
        put("decimate", self.decimate.value.to_string(), self.decimate.source);
        put(
            "reject_incomplete",
            self.reject_incomplete.value.to_string(),
            self.reject_incomplete.source,
        );
        put(
            "max_concurrent_requests",
            self.max_concurrent_requests.value.to_string(),
            self.max_concurrent_requests.source,
        );
        put(
            "request_timeout_secs",
            self.request_timeout_secs.value.to_string(),
            self.request_timeout_secs.source,
        );
        put(
            "distance_model",
            format!("{:?}", self.distance_model.value),
            self.distance_model.source,
        );
        put(
            "sampling_rates",
            format_optional_list(&self.sampling_rates.value),
            self.sampling_rates.source,
        );
        put(
            "channel_codes",
            format_optional_list(&self.channel_codes.value),
            self.channel_codes.source,
        );
        put(
            "location_codes",
            format_optional_list(&self.location_codes.value),
            self.location_codes.source,
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Default, Deserialize, Serialize)]
struct FileConfig {
    server: Option<String>,
    wp_tw_factor: Option<f64>,
    t_before_p: Option<f64>,
    t_after_wp: Option<f64>,
    dist_range: Option<[f64; 2]>,
    add_ptime: Option<bool>,
    bulk_chunk_len: Option<usize>,
    prune_cutoffs: Option<Vec<f64>>,
    decimate: Option<bool>,
    reject_incomplete: Option<bool>,
    max_concurrent_requests: Option<usize>,
    request_timeout_secs: Option<u64>,
    distance_model: Option<DistanceModel>,
    sampling_rates: Option<Vec<f64>>,
    channel_codes: Option<Vec<String>>,
    location_codes: Option<Vec<String>>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub server: Option<String>,
    pub wp_tw_factor: Option<f64>,
    pub t_before_p: Option<f64>,
    pub t_after_wp: Option<f64>,
    pub dist_range: Option<(f64, f64)>,
    pub bulk_chunk_len: Option<usize>,
    pub prune_cutoffs: Option<Vec<f64>>,
    pub no_prune: bool,
    pub no_decimate: bool,
    pub reject_incomplete: bool,
    pub max_concurrent_requests: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub distance_model: Option<DistanceModel>,
}

fn invalid(key: &str, reason: &str) -> WphaseError {
    WphaseError::ConfigInvalid { key: key.to_string(), reason: reason.to_string() }
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn format_optional_list<T: ToString>(values: &Option<Vec<T>>) -> String {
    match values {
        None => "none".to_string(),
        Some(v) => v.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(","),
    }
}

/// Read and parse an environment variable, warning on bad values
fn env_parsed<T>(key: &str, parse: impl Fn(&str) -> Result<T>) -> Option<T> {
    let raw = env::var(key).ok()?;
    match parse(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Invalid {} value '{}': {}", key, raw, e);
            None
        }
    }
}

/// Parse a boolean flag (true/false, yes/no, 1/0)
pub fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(invalid("bool", &format!("Invalid boolean: {}. Use true or false", s))),
    }
}

fn parse_f64(s: &str) -> Result<f64> {
    s.trim().parse::<f64>().map_err(|e| invalid("number", &e.to_string()))
}

fn parse_usize(s: &str) -> Result<usize> {
    s.trim().parse::<usize>().map_err(|e| invalid("integer", &e.to_string()))
}

/// Parse a comma separated list of numbers; `none`, `all` or an empty string mean no list
pub fn parse_optional_f64_list(s: &str) -> Result<Option<Vec<f64>>> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") || trimmed.eq_ignore_ascii_case("all")
    {
        return Ok(None);
    }
    trimmed.split(',').map(parse_f64).collect::<Result<Vec<_>>>().map(Some)
}

/// Parse a comma separated list of codes. `--` stands for the empty location code.
pub fn parse_optional_code_list(s: &str) -> Option<Vec<String>> {
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") || trimmed.eq_ignore_ascii_case("all")
    {
        return None;
    }
    Some(
        trimmed
            .split(',')
            .map(|c| match c.trim() {
                "--" => String::new(),
                other => other.to_string(),
            })
            .collect(),
    )
}

/// Parse a `min,max` distance range in degrees
pub fn parse_dist_range(s: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err(invalid("dist_range", &format!("expected 'min,max', got '{}'", s)));
    }
    Ok((parse_f64(parts[0])?, parse_f64(parts[1])?))
}

/// Parse distance model from string
pub fn parse_distance_model(s: &str) -> Result<DistanceModel> {
    match s.trim().to_lowercase().as_str() {
        "ellipsoidal" | "geodesic" | "wgs84" => Ok(DistanceModel::Ellipsoidal),
        "spherical" | "sphere" | "haversine" => Ok(DistanceModel::Spherical),
        _ => Err(invalid(
            "distance_model",
            &format!("Invalid distance model: {}. Use ellipsoidal or spherical", s),
        )),
    }
}
