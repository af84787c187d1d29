//! Integration tests for StationXML inventory reading

use std::fs;
use tempfile::TempDir;
use wphase_acquisition::build_catalog;
use wphase_core::config::CatalogFilters;
use wphase_core::error::WphaseError;
use wphase_core::models::TransferFunction;
use wphase_fdsn::{parse_station_xml, read_inventory};

const INVENTORY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<FDSNStationXML xmlns="http://www.fdsn.org/xml/station/1" schemaVersion="1.1">
  <Source>IRIS-DMC</Source>
  <Sender>IRIS-DMC</Sender>
  <Created>2021-03-05T00:00:00.0000</Created>
  <Network code="AU" startDate="1970-01-01T00:00:00.0000">
    <Description>Australian National Seismograph Network</Description>
    <Station code="ARMA" startDate="2000-01-01T00:00:00.0000">
      <Latitude>-30.4198</Latitude>
      <Longitude>151.6276</Longitude>
      <Elevation>590.0</Elevation>
      <Site>
        <Name>Armidale, New South Wales</Name>
      </Site>
      <CreationDate>2000-01-01T00:00:00.0000</CreationDate>
      <TotalNumberChannels>2</TotalNumberChannels>
      <SelectedNumberChannels>2</SelectedNumberChannels>
      <Channel code="BHZ" locationCode="" startDate="2000-01-01T00:00:00.0000">
        <Latitude>-30.4198</Latitude>
        <Longitude>151.6276</Longitude>
        <Elevation>590.0</Elevation>
        <Depth>0.0</Depth>
        <Azimuth>0.0</Azimuth>
        <Dip>-90.0</Dip>
        <Type>CONTINUOUS</Type>
        <SampleRate>20.0</SampleRate>
        <Sensor>
          <Description>Streckeisen STS-2</Description>
        </Sensor>
        <Response>
          <InstrumentSensitivity>
            <Value>6.2914E8</Value>
            <Frequency>0.05</Frequency>
            <InputUnits><Name>M/S</Name></InputUnits>
            <OutputUnits><Name>COUNTS</Name></OutputUnits>
          </InstrumentSensitivity>
          <Stage number="1">
            <PolesZeros>
              <InputUnits><Name>M/S</Name></InputUnits>
              <OutputUnits><Name>V</Name></OutputUnits>
              <PzTransferFunctionType>LAPLACE (RADIANS/SECOND)</PzTransferFunctionType>
              <NormalizationFactor>3.948580E17</NormalizationFactor>
              <NormalizationFrequency>0.05</NormalizationFrequency>
              <Zero number="0">
                <Real>0.0</Real>
                <Imaginary>0.0</Imaginary>
              </Zero>
              <Zero number="1">
                <Real>0.0</Real>
                <Imaginary>0.0</Imaginary>
              </Zero>
              <Pole number="0">
                <Real>-0.037004</Real>
                <Imaginary>0.037016</Imaginary>
              </Pole>
              <Pole number="1">
                <Real>-0.037004</Real>
                <Imaginary>-0.037016</Imaginary>
              </Pole>
              <Pole number="2">
                <Real>-251.33</Real>
                <Imaginary>0.0</Imaginary>
              </Pole>
            </PolesZeros>
            <StageGain>
              <Value>1500.0</Value>
              <Frequency>0.05</Frequency>
            </StageGain>
          </Stage>
          <Stage number="2">
            <Coefficients>
              <InputUnits><Name>V</Name></InputUnits>
              <OutputUnits><Name>COUNTS</Name></OutputUnits>
              <CfTransferFunctionType>DIGITAL</CfTransferFunctionType>
            </Coefficients>
            <StageGain>
              <Value>419430.0</Value>
              <Frequency>0.05</Frequency>
            </StageGain>
          </Stage>
        </Response>
      </Channel>
      <Channel code="LHZ" locationCode="10" startDate="2000-01-01T00:00:00.0000">
        <Elevation>590.0</Elevation>
        <Depth>0.0</Depth>
        <Azimuth>0.0</Azimuth>
        <Dip>-90.0</Dip>
        <SampleRate>1.0</SampleRate>
        <Response>
          <InstrumentSensitivity>
            <Value>1.0E9</Value>
            <Frequency>0.02</Frequency>
          </InstrumentSensitivity>
          <Stage number="1">
            <PolesZeros>
              <PzTransferFunctionType>LAPLACE (HERTZ)</PzTransferFunctionType>
              <NormalizationFactor>1.0</NormalizationFactor>
              <NormalizationFrequency>0.02</NormalizationFrequency>
              <Pole number="0">
                <Real>-0.01</Real>
                <Imaginary>0.0</Imaginary>
              </Pole>
            </PolesZeros>
          </Stage>
        </Response>
      </Channel>
    </Station>
  </Network>
  <Network code="IU">
    <Station code="ANMO">
      <Latitude>34.9459</Latitude>
      <Longitude>-106.4572</Longitude>
      <Elevation>1850.0</Elevation>
    </Station>
  </Network>
</FDSNStationXML>"#;

#[test]
fn test_full_response_is_read() {
    let inventory = parse_station_xml(INVENTORY).unwrap();

    assert_eq!(inventory.networks.len(), 2);
    assert_eq!(inventory.channel_count(), 2);

    let station = &inventory.networks[0].stations[0];
    assert_eq!(station.code, "ARMA");
    assert_eq!(station.latitude, Some(-30.4198));

    let bhz = &station.channels[0];
    assert_eq!(bhz.location_code, "");
    assert_eq!(bhz.sample_rate, Some(20.0));
    let response = bhz.response.as_ref().unwrap();
    assert_eq!(response.instrument_sensitivity, Some(6.2914e8));
    let paz = response.poles_zeros.as_ref().unwrap();
    assert_eq!(paz.normalization_factor, Some(3.94858e17));
    assert_eq!(paz.zeros.len(), 2);
    assert_eq!(paz.poles.len(), 3);
    assert_eq!(paz.poles[1].imaginary, Some(-0.037016));
    assert_eq!(
        TransferFunction::from_stationxml(paz.transfer_function_type.as_deref().unwrap()),
        TransferFunction::LaplaceRadians
    );
}

#[test]
fn test_channel_without_coordinates_and_hertz_response() {
    let inventory = parse_station_xml(INVENTORY).unwrap();
    let lhz = &inventory.networks[0].stations[0].channels[1];

    assert_eq!(lhz.location_code, "10");
    assert_eq!(lhz.latitude, None);
    let paz = lhz.response.as_ref().unwrap().poles_zeros.as_ref().unwrap();
    assert!(paz.zeros.is_empty());
    assert_eq!(
        TransferFunction::from_stationxml(paz.transfer_function_type.as_deref().unwrap()),
        TransferFunction::LaplaceHertz
    );
}

#[test]
fn test_both_channels_catalogued() {
    let inventory = parse_station_xml(INVENTORY).unwrap();
    let build = build_catalog(&inventory, &CatalogFilters::none());
    assert!(build.failures.is_empty());
    assert_eq!(build.catalog.len(), 2);
}

#[test]
fn test_empty_dip_fails_only_that_channel() {
    let xml = INVENTORY.replacen("<Dip>-90.0</Dip>", "<Dip></Dip>", 1);
    let inventory = parse_station_xml(&xml).unwrap();
    assert_eq!(inventory.channel_count(), 2);

    let build = build_catalog(&inventory, &CatalogFilters::none());

    assert_eq!(build.failed_ids(), vec!["AU.ARMA..BHZ"]);
    assert!(build.failures[0].reason.contains("dip"));
    assert_eq!(build.catalog.len(), 1);
    assert!(build.catalog.contains_key("AU.ARMA.10.LHZ"));
}

#[test]
fn test_pole_without_real_part_fails_only_that_channel() {
    let xml = INVENTORY.replace("<Real>-0.01</Real>", "");
    let inventory = parse_station_xml(&xml).unwrap();

    let lhz = &inventory.networks[0].stations[0].channels[1];
    let paz = lhz.response.as_ref().unwrap().poles_zeros.as_ref().unwrap();
    assert_eq!(paz.poles[0].real, None);
    assert_eq!(paz.poles[0].imaginary, Some(0.0));

    let build = build_catalog(&inventory, &CatalogFilters::none());

    assert_eq!(build.failed_ids(), vec!["AU.ARMA.10.LHZ"]);
    assert_eq!(build.catalog.len(), 1);
    assert!(build.catalog.contains_key("AU.ARMA..BHZ"));
}

#[test]
fn test_station_without_channels() {
    let inventory = parse_station_xml(INVENTORY).unwrap();
    let anmo = &inventory.networks[1].stations[0];
    assert_eq!(anmo.code, "ANMO");
    assert!(anmo.channels.is_empty());
}

#[test]
fn test_read_inventory_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("inventory.xml");
    fs::write(&path, INVENTORY).unwrap();

    let inventory = read_inventory(&path).unwrap();

    assert_eq!(inventory.channel_count(), 2);
}

#[test]
fn test_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = read_inventory(temp_dir.path().join("absent.xml")).unwrap_err();
    assert!(matches!(err, WphaseError::Io(_)));
}
