//! Raw instrument inventory (network → station → channel).
//!
//! Mirrors the StationXML hierarchy. Fields needed for catalog extraction are
//! optional so that malformed channels can be carried through and reported
//! instead of failing the whole inventory.

use serde::{Deserialize, Serialize};

use super::channel::Root;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    pub networks: Vec<Network>,
}

impl Inventory {
    /// Total number of channels across all networks and stations
    pub fn channel_count(&self) -> usize {
        self.networks
            .iter()
            .flat_map(|n| n.stations.iter())
            .map(|s| s.channels.len())
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub code: String,
    #[serde(default)]
    pub stations: Vec<Station>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub code: String,
    #[serde(default)]
    pub location_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
    pub azimuth: Option<f64>,
    pub dip: Option<f64>,
    pub sample_rate: Option<f64>,
    pub response: Option<Response>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Overall sensitivity value
    pub instrument_sensitivity: Option<f64>,
    /// First poles/zeros stage of the response, if any
    pub poles_zeros: Option<PolesZeros>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolesZeros {
    pub transfer_function_type: Option<String>,
    pub normalization_factor: Option<f64>,
    #[serde(default)]
    pub poles: Vec<RawRoot>,
    #[serde(default)]
    pub zeros: Vec<RawRoot>,
}

/// Pole or zero as read from the inventory, either part possibly unreadable
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRoot {
    pub real: Option<f64>,
    pub imaginary: Option<f64>,
}

impl From<Root> for RawRoot {
    fn from(root: Root) -> Self {
        RawRoot { real: Some(root.real), imaginary: Some(root.imaginary) }
    }
}
