//! Channel identifiers and per-channel instrument metadata.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WphaseError};

/// SEED channel identifier in `NET.STA.LOC.CHA` form.
///
/// The location part may be empty (`AU.ARMA..BHZ`). Construction validates the
/// four-part shape, so the accessors never fail.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Build an identifier from its four components
    pub fn new(network: &str, station: &str, location: &str, channel: &str) -> Result<Self> {
        Self::parse(&format!("{}.{}.{}.{}", network, station, location, channel))
    }

    /// Parse a dotted identifier
    pub fn parse(id: &str) -> Result<Self> {
        let parts: Vec<&str> = id.split('.').collect();
        let valid = parts.len() == 4
            && !parts[0].is_empty()
            && !parts[1].is_empty()
            && !parts[3].is_empty();
        if !valid {
            return Err(WphaseError::InvalidChannelId { id: id.to_string() });
        }
        Ok(Self(id.to_string()))
    }

    fn parts(&self) -> [&str; 4] {
        let mut it = self.0.split('.');
        let mut out = [""; 4];
        for slot in out.iter_mut() {
            *slot = it.next().unwrap_or_default();
        }
        out
    }

    pub fn network(&self) -> &str {
        self.parts()[0]
    }

    pub fn station(&self) -> &str {
        self.parts()[1]
    }

    pub fn location(&self) -> &str {
        self.parts()[2]
    }

    /// Band + instrument + component code, e.g. `BHZ`
    pub fn channel(&self) -> &str {
        self.parts()[3]
    }

    /// First letter of the channel code (`B` for broadband, `L` for long period)
    pub fn band_code(&self) -> char {
        self.channel().chars().next().unwrap_or(' ')
    }

    /// The `(network, station)` pair this channel belongs to
    pub fn station_key(&self) -> StationKey {
        StationKey { network: self.network().to_string(), station: self.station().to_string() }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChannelId {
    type Err = WphaseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ChannelId {
    type Error = WphaseError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

impl Borrow<str> for ChannelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Station identity used for pruning: `NET.STA`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationKey {
    pub network: String,
    pub station: String,
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.network, self.station)
    }
}

/// Poles/zeros transfer function kind.
///
/// Downstream response removal keys on the one-letter codes, so the
/// serialized form is `A`, `B` or `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferFunction {
    /// Laplace transform in radians/second
    #[serde(rename = "A")]
    LaplaceRadians,
    /// Laplace transform in hertz
    #[serde(rename = "B")]
    LaplaceHertz,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl TransferFunction {
    /// Map StationXML transfer function text, exact match only
    pub fn from_stationxml(text: &str) -> Self {
        match text {
            "LAPLACE (RADIANS/SECOND)" => TransferFunction::LaplaceRadians,
            "LAPLACE (HERTZ)" => TransferFunction::LaplaceHertz,
            _ => TransferFunction::Unknown,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            TransferFunction::LaplaceRadians => "A",
            TransferFunction::LaplaceHertz => "B",
            TransferFunction::Unknown => "Unknown",
        }
    }
}

/// A complex pole or zero
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub real: f64,
    pub imaginary: f64,
}

impl Root {
    pub fn new(real: f64, imaginary: f64) -> Self {
        Self { real, imaginary }
    }
}

/// Instrument response summary consumed by deconvolution downstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    pub poles: Vec<Root>,
    pub zeros: Vec<Root>,
    /// Normalization factor (A0) of the poles/zeros stage
    pub gain: f64,
    /// Overall instrument sensitivity
    pub sensitivity: f64,
    pub transfer_function: TransferFunction,
}

/// Metadata for one recording channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetadata {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub azimuth: f64,
    pub dip: f64,
    pub sampling_rate: f64,
    pub response: ResponseDescriptor,

    /// P-wave arrival in seconds after origin time; set on annotated copies only
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "ptime")]
    pub p_arrival: Option<f64>,
}

impl ChannelMetadata {
    /// Copy of this metadata carrying a P arrival offset
    pub fn with_p_arrival(&self, seconds: f64) -> Self {
        Self { p_arrival: Some(seconds), ..self.clone() }
    }
}

/// Channel metadata catalog keyed by channel id
pub type Catalog = BTreeMap<ChannelId, ChannelMetadata>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_id_parts() {
        let id = ChannelId::parse("AU.ARMA.00.BHZ").unwrap();
        assert_eq!(id.network(), "AU");
        assert_eq!(id.station(), "ARMA");
        assert_eq!(id.location(), "00");
        assert_eq!(id.channel(), "BHZ");
        assert_eq!(id.band_code(), 'B');
        assert_eq!(id.station_key().to_string(), "AU.ARMA");
    }

    #[test]
    fn test_channel_id_empty_location() {
        let id: ChannelId = "AU.CANB..LHN".parse().unwrap();
        assert_eq!(id.location(), "");
        assert_eq!(id.channel(), "LHN");
        assert_eq!(ChannelId::new("AU", "CANB", "", "LHN").unwrap(), id);
    }

    #[test]
    fn test_channel_id_rejects_malformed() {
        assert!(ChannelId::parse("AU.ARMA.BHZ").is_err());
        assert!(ChannelId::parse("AU.ARMA.00.BHZ.X").is_err());
        assert!(ChannelId::parse(".ARMA.00.BHZ").is_err());
        assert!(ChannelId::parse("AU.ARMA.00.").is_err());
    }

    #[test]
    fn test_channel_id_serde_roundtrip_validates() {
        let json = serde_json::to_string(&ChannelId::parse("IU.ANMO.10.BHZ").unwrap()).unwrap();
        assert_eq!(json, "\"IU.ANMO.10.BHZ\"");
        assert!(serde_json::from_str::<ChannelId>("\"bad\"").is_err());
    }

    #[test]
    fn test_transfer_function_exact_match() {
        assert_eq!(
            TransferFunction::from_stationxml("LAPLACE (RADIANS/SECOND)"),
            TransferFunction::LaplaceRadians
        );
        assert_eq!(TransferFunction::from_stationxml("LAPLACE (HERTZ)"), TransferFunction::LaplaceHertz);
        // Case and spacing matter
        assert_eq!(TransferFunction::from_stationxml("laplace (hertz)"), TransferFunction::Unknown);
        assert_eq!(TransferFunction::from_stationxml("DIGITAL (Z-TRANSFORM)"), TransferFunction::Unknown);
        assert_eq!(TransferFunction::LaplaceRadians.code(), "A");
        assert_eq!(TransferFunction::LaplaceHertz.code(), "B");
        assert_eq!(TransferFunction::Unknown.code(), "Unknown");
    }

    #[test]
    fn test_catalog_lookup_by_str() {
        let mut catalog: BTreeMap<ChannelId, u32> = BTreeMap::new();
        catalog.insert(ChannelId::parse("AU.ARMA..BHZ").unwrap(), 1);
        assert_eq!(catalog.get("AU.ARMA..BHZ"), Some(&1));
    }
}
