//! FDSN StationXML reader.
//!
//! Only the parts of the schema needed to build a channel catalog are read;
//! everything else in the document is skipped.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use wphase_core::error::{Result, WphaseError};
use wphase_core::models::inventory::{Channel, Network, PolesZeros, RawRoot, Response, Station};
use wphase_core::models::Inventory;

#[derive(Debug, Deserialize)]
struct XmlDocument {
    #[serde(rename = "Network", default)]
    networks: Vec<XmlNetwork>,
}

#[derive(Debug, Deserialize)]
struct XmlNetwork {
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "Station", default)]
    stations: Vec<XmlStation>,
}

#[derive(Debug, Deserialize)]
struct XmlStation {
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "Latitude")]
    latitude: Option<XmlFloat>,
    #[serde(rename = "Longitude")]
    longitude: Option<XmlFloat>,
    #[serde(rename = "Elevation")]
    elevation: Option<XmlFloat>,
    #[serde(rename = "Channel", default)]
    channels: Vec<XmlChannel>,
}

#[derive(Debug, Deserialize)]
struct XmlChannel {
    #[serde(rename = "@code")]
    code: String,
    #[serde(rename = "@locationCode", default)]
    location_code: String,
    #[serde(rename = "Latitude")]
    latitude: Option<XmlFloat>,
    #[serde(rename = "Longitude")]
    longitude: Option<XmlFloat>,
    #[serde(rename = "Elevation")]
    elevation: Option<XmlFloat>,
    #[serde(rename = "Azimuth")]
    azimuth: Option<XmlFloat>,
    #[serde(rename = "Dip")]
    dip: Option<XmlFloat>,
    #[serde(rename = "SampleRate")]
    sample_rate: Option<XmlFloat>,
    #[serde(rename = "Response")]
    response: Option<XmlResponse>,
}

#[derive(Debug, Deserialize)]
struct XmlResponse {
    #[serde(rename = "InstrumentSensitivity")]
    instrument_sensitivity: Option<XmlSensitivity>,
    #[serde(rename = "Stage", default)]
    stages: Vec<XmlStage>,
}

#[derive(Debug, Deserialize)]
struct XmlSensitivity {
    #[serde(rename = "Value")]
    value: Option<XmlFloat>,
}

#[derive(Debug, Deserialize)]
struct XmlStage {
    #[serde(rename = "PolesZeros")]
    poles_zeros: Option<XmlPolesZeros>,
}

#[derive(Debug, Deserialize)]
struct XmlPolesZeros {
    #[serde(rename = "PzTransferFunctionType")]
    transfer_function_type: Option<String>,
    #[serde(rename = "NormalizationFactor")]
    normalization_factor: Option<XmlFloat>,
    #[serde(rename = "Zero", default)]
    zeros: Vec<XmlRoot>,
    #[serde(rename = "Pole", default)]
    poles: Vec<XmlRoot>,
}

#[derive(Debug, Deserialize)]
struct XmlRoot {
    #[serde(rename = "Real", default)]
    real: Option<XmlFloat>,
    #[serde(rename = "Imaginary", default)]
    imaginary: Option<XmlFloat>,
}

/// Numeric element that may carry unit or error attributes.
///
/// The text is kept raw so an empty or non-numeric value only blanks this
/// field and the owning channel can be reported on its own.
#[derive(Debug, Deserialize)]
struct XmlFloat {
    #[serde(rename = "$text", default)]
    text: Option<String>,
}

fn value(v: Option<XmlFloat>) -> Option<f64> {
    v?.text?.trim().parse().ok()
}

impl From<XmlRoot> for RawRoot {
    fn from(root: XmlRoot) -> Self {
        RawRoot { real: value(root.real), imaginary: value(root.imaginary) }
    }
}

impl From<XmlChannel> for Channel {
    fn from(channel: XmlChannel) -> Self {
        Channel {
            code: channel.code,
            location_code: channel.location_code,
            latitude: value(channel.latitude),
            longitude: value(channel.longitude),
            elevation: value(channel.elevation),
            azimuth: value(channel.azimuth),
            dip: value(channel.dip),
            sample_rate: value(channel.sample_rate),
            response: channel.response.map(Response::from),
        }
    }
}

impl From<XmlResponse> for Response {
    fn from(response: XmlResponse) -> Self {
        // The first poles/zeros stage describes the sensor
        let poles_zeros = response
            .stages
            .into_iter()
            .find_map(|stage| stage.poles_zeros)
            .map(|pz| PolesZeros {
                transfer_function_type: pz.transfer_function_type.map(|t| t.trim().to_string()),
                normalization_factor: value(pz.normalization_factor),
                poles: pz.poles.into_iter().map(RawRoot::from).collect(),
                zeros: pz.zeros.into_iter().map(RawRoot::from).collect(),
            });

        Response {
            instrument_sensitivity: response.instrument_sensitivity.and_then(|s| value(s.value)),
            poles_zeros,
        }
    }
}

/// Parse a StationXML document into an inventory
pub fn parse_station_xml(xml: &str) -> Result<Inventory> {
    let document: XmlDocument = quick_xml::de::from_str(xml).map_err(|e| WphaseError::Inventory {
        reason: format!("invalid StationXML: {}", e),
    })?;

    let networks = document
        .networks
        .into_iter()
        .map(|network| Network {
            code: network.code,
            stations: network
                .stations
                .into_iter()
                .map(|station| Station {
                    code: station.code,
                    latitude: value(station.latitude),
                    longitude: value(station.longitude),
                    elevation: value(station.elevation),
                    channels: station.channels.into_iter().map(Channel::from).collect(),
                })
                .collect(),
        })
        .collect();

    Ok(Inventory { networks })
}

/// Read a StationXML file from disk
pub fn read_inventory<P: AsRef<Path>>(path: P) -> Result<Inventory> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    let inventory = parse_station_xml(&xml)?;

    tracing::info!(
        path = %path.display(),
        networks = inventory.networks.len(),
        channels = inventory.channel_count(),
        "Inventory loaded"
    );

    Ok(inventory)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<FDSNStationXML xmlns="http://www.fdsn.org/xml/station/1" schemaVersion="1.1">
  <Source>test</Source>
  <Created>2021-03-04T00:00:00</Created>
  <Network code="IU">
    <Station code="ANMO">
      <Latitude>34.9459</Latitude>
      <Longitude>-106.4572</Longitude>
      <Elevation>1850.0</Elevation>
      <Channel code="LHZ" locationCode="00">
        <Latitude unit="DEGREES">34.9459</Latitude>
        <Longitude unit="DEGREES">-106.4572</Longitude>
        <Elevation>1671.0</Elevation>
        <Depth>145.0</Depth>
        <Azimuth>0.0</Azimuth>
        <Dip>-90.0</Dip>
        <SampleRate>1.0</SampleRate>
      </Channel>
    </Station>
  </Network>
</FDSNStationXML>"#;

    #[test]
    fn test_channel_without_response() {
        let inventory = parse_station_xml(MINIMAL).unwrap();
        let channel = &inventory.networks[0].stations[0].channels[0];
        assert_eq!(channel.code, "LHZ");
        assert_eq!(channel.location_code, "00");
        assert_eq!(channel.latitude, Some(34.9459));
        assert_eq!(channel.dip, Some(-90.0));
        assert_eq!(channel.sample_rate, Some(1.0));
        assert!(channel.response.is_none());
    }

    #[test]
    fn test_unreadable_numbers_become_missing_fields() {
        let xml = MINIMAL
            .replace("<Dip>-90.0</Dip>", "<Dip></Dip>")
            .replace("<SampleRate>1.0</SampleRate>", "<SampleRate>fast</SampleRate>");
        let inventory = parse_station_xml(&xml).unwrap();
        let channel = &inventory.networks[0].stations[0].channels[0];
        assert_eq!(channel.dip, None);
        assert_eq!(channel.sample_rate, None);
        assert_eq!(channel.azimuth, Some(0.0));
    }

    #[test]
    fn test_malformed_document_is_inventory_error() {
        let err = parse_station_xml("<FDSNStationXML><Network code=\"IU\">").unwrap_err();
        assert!(matches!(err, WphaseError::Inventory { .. }));
    }
}
