use wphase_core::models::{Catalog, ChannelId, DistanceModel};

use crate::distance::epicentral_distance;

/// Channels whose epicentral distance lies within `[min, max]` degrees.
///
/// Both bounds are inclusive. Results follow catalog order and carry the
/// computed distance alongside each id.
pub fn filter_by_distance(
    catalog: &Catalog,
    latitude: f64,
    longitude: f64,
    range: (f64, f64),
    model: DistanceModel,
) -> Vec<(ChannelId, f64)> {
    let (min, max) = range;

    let in_range: Vec<(ChannelId, f64)> = catalog
        .iter()
        .filter_map(|(id, meta)| {
            let dist = epicentral_distance(latitude, longitude, meta.latitude, meta.longitude, model);
            if dist >= min && dist <= max {
                Some((id.clone(), dist))
            } else {
                None
            }
        })
        .collect();

    tracing::debug!(
        candidates = catalog.len(),
        in_range = in_range.len(),
        min_deg = min,
        max_deg = max,
        "Distance filter applied"
    );

    in_range
}
