use wphase_core::models::{
    Catalog, ChannelId, ChannelMetadata, ResponseDescriptor, TransferFunction,
};

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

pub fn id(s: &str) -> ChannelId {
    ChannelId::parse(s).unwrap()
}

pub fn catalog(entries: &[(&str, f64, f64)]) -> Catalog {
    entries.iter().map(|(s, lat, lon)| (id(s), metadata_at(*lat, *lon))).collect()
}
