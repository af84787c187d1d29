//! Channel metadata catalog construction from a raw inventory.

use serde::{Deserialize, Serialize};
use wphase_core::config::CatalogFilters;
use wphase_core::error::{Result, WphaseError};
use wphase_core::models::inventory::{Channel, RawRoot, Station};
use wphase_core::models::{
    Catalog, ChannelId, ChannelMetadata, Inventory, ResponseDescriptor, Root, TransferFunction,
};

const RATE_TOLERANCE: f64 = 1e-6;

/// A channel that passed the filters but could not be extracted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogFailure {
    /// Dotted `NET.STA.LOC.CHA` id of the offending channel
    pub id: String,
    pub reason: String,
}

/// Result of building a catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogBuild {
    pub catalog: Catalog,
    pub failures: Vec<CatalogFailure>,
}

impl CatalogBuild {
    /// Ids of failed channels, in inventory order
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.id.as_str()).collect()
    }
}

/// Build a channel catalog from an inventory.
///
/// Channels failing an active filter are skipped silently. Channels that pass
/// the filters but lack a required field are recorded in `failures` and the
/// build carries on with the next channel.
pub fn build_catalog(inventory: &Inventory, filters: &CatalogFilters) -> CatalogBuild {
    let mut build = CatalogBuild::default();

    for network in &inventory.networks {
        for station in &network.stations {
            for channel in &station.channels {
                if !passes_filters(channel, filters) {
                    continue;
                }

                // The id is fixed before anything fallible so failures always name this channel
                let raw_id = format!(
                    "{}.{}.{}.{}",
                    network.code, station.code, channel.location_code, channel.code
                );

                let extracted = ChannelId::parse(&raw_id)
                    .and_then(|id| extract_channel(&raw_id, station, channel).map(|m| (id, m)));

                match extracted {
                    Ok((id, metadata)) => {
                        if build.catalog.contains_key(&id) {
                            tracing::debug!(channel = %id, "Ignoring repeated channel epoch");
                            continue;
                        }
                        build.catalog.insert(id, metadata);
                    }
                    Err(e) => {
                        tracing::debug!(channel = %raw_id, error = %e, "Channel metadata extraction failed");
                        build.failures.push(CatalogFailure { id: raw_id, reason: e.to_string() });
                    }
                }
            }
        }
    }

    tracing::info!(
        channels = build.catalog.len(),
        failures = build.failures.len(),
        "Metadata catalog built"
    );

    build
}

fn passes_filters(channel: &Channel, filters: &CatalogFilters) -> bool {
    if let Some(codes) = &filters.channel_codes {
        let mut chars = channel.code.chars();
        chars.next_back();
        let prefix = chars.as_str();
        if !codes.iter().any(|c| c == prefix) {
            return false;
        }
    }

    if let Some(rates) = &filters.sampling_rates {
        match channel.sample_rate {
            Some(rate) if rates.iter().any(|r| (r - rate).abs() < RATE_TOLERANCE) => {}
            _ => return false,
        }
    }

    if let Some(locations) = &filters.location_codes {
        if !locations.iter().any(|l| l == &channel.location_code) {
            return false;
        }
    }

    true
}

fn required(value: Option<f64>, id: &str, field: &str) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(WphaseError::extraction(id, format!("{} is not a finite number", field))),
        None => Err(WphaseError::extraction(id, format!("missing {}", field))),
    }
}

fn required_roots(roots: &[RawRoot], id: &str, kind: &str) -> Result<Vec<Root>> {
    roots
        .iter()
        .enumerate()
        .map(|(i, root)| {
            let field = format!("{} {}", kind, i);
            let real = required(root.real, id, &format!("{} real part", field))?;
            let imaginary = required(root.imaginary, id, &format!("{} imaginary part", field))?;
            Ok(Root::new(real, imaginary))
        })
        .collect()
}

fn extract_channel(id: &str, station: &Station, channel: &Channel) -> Result<ChannelMetadata> {
    let latitude = required(channel.latitude.or(station.latitude), id, "latitude")?;
    let longitude = required(channel.longitude.or(station.longitude), id, "longitude")?;
    let elevation = required(channel.elevation.or(station.elevation), id, "elevation")?;
    let azimuth = required(channel.azimuth, id, "azimuth")?;
    let dip = required(channel.dip, id, "dip")?;
    let sampling_rate = required(channel.sample_rate, id, "sample rate")?;

    let response = channel
        .response
        .as_ref()
        .ok_or_else(|| WphaseError::extraction(id, "missing response"))?;
    let paz = response
        .poles_zeros
        .as_ref()
        .ok_or_else(|| WphaseError::extraction(id, "response has no poles/zeros stage"))?;
    let tf_text = paz
        .transfer_function_type
        .as_deref()
        .ok_or_else(|| WphaseError::extraction(id, "missing transfer function type"))?;
    let gain = required(paz.normalization_factor, id, "normalization factor")?;
    let sensitivity = required(response.instrument_sensitivity, id, "instrument sensitivity")?;
    let poles = required_roots(&paz.poles, id, "pole")?;
    let zeros = required_roots(&paz.zeros, id, "zero")?;

    Ok(ChannelMetadata {
        latitude,
        longitude,
        elevation,
        azimuth,
        dip,
        sampling_rate,
        response: ResponseDescriptor {
            poles,
            zeros,
            gain,
            sensitivity,
            transfer_function: TransferFunction::from_stationxml(tf_text),
        },
        p_arrival: None,
    })
}
