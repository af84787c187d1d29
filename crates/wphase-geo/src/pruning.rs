//! Distance-cutoff station pruning.
//!
//! For each cutoff in the schedule, the station with the most neighbours closer
//! than the cutoff is removed, repeatedly, until every surviving pair is at
//! least `cutoff` degrees apart. Ties go to the station that appears first in
//! the input. Repeating the last cutoff re-runs that tier on the thinned set,
//! which is a no-op once the separation holds.

use wphase_core::models::{Catalog, ChannelId, DistanceModel};
use wphase_core::ports::StationPruning;

use crate::distance::epicentral_distance;

/// Default station pruning primitive operating on catalog coordinates only
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceCutoffPruner {
    model: DistanceModel,
}

impl DistanceCutoffPruner {
    pub fn new(model: DistanceModel) -> Self {
        Self { model }
    }
}

impl StationPruning for DistanceCutoffPruner {
    fn prune(&self, catalog: &Catalog, stations: &[ChannelId], cutoffs: &[f64]) -> Vec<ChannelId> {
        let located: Vec<(&ChannelId, f64, f64)> = stations
            .iter()
            .filter_map(|id| catalog.get(id).map(|m| (id, m.latitude, m.longitude)))
            .collect();

        let n = located.len();
        let mut dist = vec![0.0_f64; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = epicentral_distance(
                    located[i].1,
                    located[i].2,
                    located[j].1,
                    located[j].2,
                    self.model,
                );
                dist[i * n + j] = d;
                dist[j * n + i] = d;
            }
        }

        let mut alive = vec![true; n];
        for &cutoff in cutoffs {
            let neighbours = neighbours_within(&dist, &alive, cutoff);
            let mut crowding: Vec<usize> = neighbours.iter().map(Vec::len).collect();

            while let Some(worst) = most_crowded(&crowding, &alive) {
                alive[worst] = false;
                for &j in &neighbours[worst] {
                    if alive[j] {
                        crowding[j] -= 1;
                    }
                }
            }

            tracing::trace!(
                cutoff_deg = cutoff,
                remaining = alive.iter().filter(|a| **a).count(),
                "Pruning tier complete"
            );
        }

        located
            .into_iter()
            .zip(alive)
            .filter_map(|((id, _, _), keep)| keep.then(|| id.clone()))
            .collect()
    }
}

/// Surviving stations closer than `cutoff` to each surviving station
fn neighbours_within(dist: &[f64], alive: &[bool], cutoff: f64) -> Vec<Vec<usize>> {
    let n = alive.len();
    let mut neighbours = vec![Vec::new(); n];
    for i in (0..n).filter(|&i| alive[i]) {
        for j in ((i + 1)..n).filter(|&j| alive[j]) {
            if dist[i * n + j] < cutoff {
                neighbours[i].push(j);
                neighbours[j].push(i);
            }
        }
    }
    neighbours
}

/// Surviving station with the most close neighbours; the earliest wins a tie
fn most_crowded(crowding: &[usize], alive: &[bool]) -> Option<usize> {
    let mut worst: Option<(usize, usize)> = None;
    for (i, &count) in crowding.iter().enumerate() {
        if alive[i] && count > 0 && worst.map_or(true, |(_, c)| count > c) {
            worst = Some((i, count));
        }
    }
    worst.map(|(i, _)| i)
}
