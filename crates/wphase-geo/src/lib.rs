//! W-phase Geo - Epicentral distances and station geometry
//!
//! This crate handles the geodetic side of acquisition: distance from the
//! hypocentre, distance-range filtering and coordinate-based station pruning.

pub mod distance;
pub mod filter;
pub mod pruning;

pub use distance::{epicentral_distance, MEAN_EARTH_RADIUS_M};
pub use filter::filter_by_distance;
pub use pruning::DistanceCutoffPruner;

#[cfg(test)]
pub(crate) mod test_support;
