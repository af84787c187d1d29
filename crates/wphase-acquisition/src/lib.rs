//! W-phase Acquisition - Catalog building and waveform retrieval
//!
//! This crate implements the acquisition use cases: turning an inventory into a
//! channel catalog, planning request windows, pruning, bulk retrieval,
//! deduplication and decimation to 1 Hz.

pub mod catalog;
pub mod decimate;
pub mod dedup;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod pruning;
pub mod travel_time;
pub mod windows;

pub use catalog::{build_catalog, CatalogBuild, CatalogFailure};
pub use decimate::{Decimator, FirCascade, FirStage};
pub use dedup::remove_ambiguous;
pub use fetch::{BulkFetcher, FetchOutcome, FetchReport};
pub use models::{AcquisitionOutput, AcquisitionPlan, AcquisitionReport};
pub use pipeline::AcquisitionPipeline;
pub use pruning::prune_stations;
pub use travel_time::TabulatedTravelTimes;
pub use windows::{annotate_arrivals, plan_windows, window_for, WindowPlan};

#[cfg(test)]
pub(crate) mod test_support;
