use chrono::{DateTime, Utc};
use wphase_core::config::AcquisitionConfig;
use wphase_core::models::{Catalog, ChannelId, EarthquakeInfo, TimeWindows};
use wphase_core::ports::{StationPruning, TravelTimeModel, WaveformArchive};
use wphase_geo::filter_by_distance;

use crate::decimate::Decimator;
use crate::dedup::remove_ambiguous;
use crate::fetch::BulkFetcher;
use crate::models::{AcquisitionOutput, AcquisitionPlan, AcquisitionReport};
use crate::pruning::prune_stations;
use crate::windows::{annotate_arrivals, plan_windows};

/// Acquisition pipeline from a metadata catalog to 1 Hz waveforms
pub struct AcquisitionPipeline<A, T, P>
where
    A: WaveformArchive,
    T: TravelTimeModel,
    P: StationPruning,
{
    archive: A,
    travel_times: T,
    pruner: P,
    config: AcquisitionConfig,
    fetcher: BulkFetcher,
    decimator: Decimator,
}

impl<A, T, P> AcquisitionPipeline<A, T, P>
where
    A: WaveformArchive,
    T: TravelTimeModel,
    P: StationPruning,
{
    pub fn new(archive: A, travel_times: T, pruner: P, config: AcquisitionConfig) -> Self {
        let fetcher = BulkFetcher::from_config(&config);
        Self { archive, travel_times, pruner, config, fetcher, decimator: Decimator::standard() }
    }

    pub fn with_decimator(mut self, decimator: Decimator) -> Self {
        self.decimator = decimator;
        self
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    /// Select channels and plan their windows without contacting the archive
    pub fn plan(&self, event: &EarthquakeInfo, catalog: &Catalog) -> AcquisitionPlan {
        let in_range = self.in_range(event, catalog);
        let windows = plan_windows(
            &in_range,
            catalog,
            event,
            &self.config.window_params(),
            &self.travel_times,
        );

        let planned: Vec<ChannelId> = in_range
            .iter()
            .filter(|(id, _)| windows.windows.contains_key(id))
            .map(|(id, _)| id.clone())
            .collect();

        AcquisitionPlan {
            channels: self.prune(&planned, catalog),
            distances: in_range.into_iter().collect(),
            windows: windows.windows,
            annotated: windows.annotated,
            travel_time_failures: windows.failures,
        }
    }

    /// Run the full acquisition.
    ///
    /// Remote failures only shrink the output; the run itself always completes.
    pub async fn run(
        &self,
        event: &EarthquakeInfo,
        catalog: &Catalog,
        windows: Option<TimeWindows>,
    ) -> AcquisitionOutput {
        self.run_at(event, catalog, windows, Utc::now()).await
    }

    /// [`run`](Self::run) with an explicit wall clock for incomplete-window rejection
    pub async fn run_at(
        &self,
        event: &EarthquakeInfo,
        catalog: &Catalog,
        windows: Option<TimeWindows>,
        now: DateTime<Utc>,
    ) -> AcquisitionOutput {
        let mut report = AcquisitionReport { catalog_channels: catalog.len(), ..Default::default() };

        let (plan, planned_count) = match windows {
            None => {
                let plan = self.plan(event, catalog);
                let planned = plan.windows.len();
                (plan, planned)
            }
            Some(injected) => {
                let in_range = self.in_range(event, catalog);
                let (annotated, failures) = if self.config.add_ptime.value {
                    annotate_arrivals(&in_range, catalog, event, &self.travel_times)
                } else {
                    (Catalog::new(), Vec::new())
                };
                let planned: Vec<ChannelId> = in_range
                    .iter()
                    .filter(|(id, _)| injected.contains_key(id))
                    .map(|(id, _)| id.clone())
                    .collect();
                let count = planned.len();
                let plan = AcquisitionPlan {
                    channels: self.prune(&planned, catalog),
                    distances: in_range.into_iter().collect(),
                    windows: injected,
                    annotated,
                    travel_time_failures: failures,
                };
                (plan, count)
            }
        };

        report.in_range = plan.distances.len();
        report.planned = planned_count;
        report.after_pruning = plan.channels.len();
        report.travel_time_failures = plan.travel_time_failures;

        let now = self.config.reject_incomplete.value.then_some(now);
        let fetched = self.fetcher.fetch(&self.archive, &plan.channels, &plan.windows, now).await;
        report.fetch = fetched.report;

        let (mut waveforms, ambiguous) = remove_ambiguous(fetched.buffer);
        report.after_dedup = waveforms.len();
        report.ambiguous = ambiguous;

        if self.config.decimate.value {
            let (decimated, unsupported) = self.decimator.apply(waveforms);
            waveforms = decimated;
            report.unsupported_rate = unsupported;
        }
        report.delivered = waveforms.len();

        tracing::info!(
            in_range = report.in_range,
            requested = report.fetch.requested,
            delivered = report.delivered,
            "Acquisition complete"
        );

        AcquisitionOutput {
            waveforms,
            metadata: self.config.add_ptime.value.then_some(plan.annotated),
            report,
        }
    }

    fn in_range(&self, event: &EarthquakeInfo, catalog: &Catalog) -> Vec<(ChannelId, f64)> {
        filter_by_distance(
            catalog,
            event.latitude,
            event.longitude,
            self.config.dist_range.value,
            self.config.distance_model.value,
        )
    }

    fn prune(&self, channels: &[ChannelId], catalog: &Catalog) -> Vec<ChannelId> {
        match &self.config.prune_cutoffs.value {
            Some(cutoffs) => prune_stations(channels, catalog, cutoffs, &self.pruner),
            None => channels.to_vec(),
        }
    }
}
