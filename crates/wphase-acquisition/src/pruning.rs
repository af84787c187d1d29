use std::collections::{BTreeSet, HashSet};
use wphase_core::models::{Catalog, ChannelId, StationKey};
use wphase_core::ports::StationPruning;

/// Thin a channel list by station location.
///
/// Every station is represented by its first channel in `channels`, the
/// representatives are pruned, and each input channel whose station survived
/// is returned in its original order. Whole stations are kept or dropped.
pub fn prune_stations(
    channels: &[ChannelId],
    catalog: &Catalog,
    cutoffs: &[f64],
    pruner: &dyn StationPruning,
) -> Vec<ChannelId> {
    let mut seen: HashSet<StationKey> = HashSet::new();
    let representatives: Vec<ChannelId> = channels
        .iter()
        .filter(|id| seen.insert(id.station_key()))
        .cloned()
        .collect();

    let surviving: BTreeSet<StationKey> = pruner
        .prune(catalog, &representatives, cutoffs)
        .iter()
        .map(ChannelId::station_key)
        .collect();

    let kept: Vec<ChannelId> = channels
        .iter()
        .filter(|id| surviving.contains(&id.station_key()))
        .cloned()
        .collect();

    tracing::debug!(
        stations_before = representatives.len(),
        stations_after = surviving.len(),
        channels_before = channels.len(),
        channels_after = kept.len(),
        "Station pruning applied"
    );

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{catalog, id};
    use wphase_geo::DistanceCutoffPruner;

    #[test]
    fn test_whole_stations_are_dropped() {
        let cat = catalog(&[
            ("AU.ARMA.00.BHZ", 0.0, 0.0),
            ("AU.ARMA.10.BHN", 0.0, 0.0),
            ("AU.NEAR..BHZ", 0.0, 0.5),
            ("AU.FAR..BHZ", 0.0, 20.0),
        ]);
        let channels = vec![
            id("AU.ARMA.00.BHZ"),
            id("AU.ARMA.10.BHN"),
            id("AU.NEAR..BHZ"),
            id("AU.FAR..BHZ"),
        ];

        let kept = prune_stations(&channels, &cat, &[1.0], &DistanceCutoffPruner::default());

        assert_eq!(kept, vec![id("AU.NEAR..BHZ"), id("AU.FAR..BHZ")]);
    }

    #[test]
    fn test_surviving_station_keeps_all_channels() {
        let cat = catalog(&[
            ("AU.A..BHZ", 0.0, 0.0),
            ("AU.B.00.BHZ", 0.0, 10.0),
            ("AU.B.00.BHE", 0.0, 10.0),
        ]);
        let channels = vec![id("AU.B.00.BHZ"), id("AU.A..BHZ"), id("AU.B.00.BHE")];

        let kept = prune_stations(&channels, &cat, &[1.0, 2.0], &DistanceCutoffPruner::default());

        assert_eq!(kept, channels);
    }

    #[test]
    fn test_empty_cutoffs_keep_everything() {
        let cat = catalog(&[("AU.A..BHZ", 0.0, 0.0), ("AU.B..BHZ", 0.0, 0.1)]);
        let channels = vec![id("AU.A..BHZ"), id("AU.B..BHZ")];
        assert_eq!(prune_stations(&channels, &cat, &[], &DistanceCutoffPruner::default()), channels);
    }
}
