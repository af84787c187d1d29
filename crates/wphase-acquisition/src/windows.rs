//! Request window planning around the predicted P arrival.

use wphase_core::config::WindowParams;
use wphase_core::models::{
    duration_from_secs, Catalog, ChannelId, EarthquakeInfo, TimeWindow, TimeWindows,
};
use wphase_core::ports::TravelTimeModel;

/// Windows and arrival-annotated metadata for a set of channels
#[derive(Debug, Clone, Default)]
pub struct WindowPlan {
    pub windows: TimeWindows,
    /// Copies of the catalog entries with `p_arrival` set
    pub annotated: Catalog,
    /// Channels whose travel time could not be computed
    pub failures: Vec<ChannelId>,
}

/// Window for one channel given its P travel time and distance.
///
/// `[origin + t_p - t_before_p, origin + t_p + wp_tw_factor * distance + t_after_wp]`
pub fn window_for(event: &EarthquakeInfo, params: &WindowParams, p_time: f64, distance_deg: f64) -> TimeWindow {
    let arrival = event.origin_time + duration_from_secs(p_time);
    let start = arrival - duration_from_secs(params.t_before_p);
    let end = arrival + duration_from_secs(params.wp_tw_factor * distance_deg + params.t_after_wp);
    TimeWindow::new(start, end)
}

/// Plan request windows for channels already within the distance range.
///
/// A travel time failure drops only the affected channel.
pub fn plan_windows(
    channels: &[(ChannelId, f64)],
    catalog: &Catalog,
    event: &EarthquakeInfo,
    params: &WindowParams,
    travel_times: &dyn TravelTimeModel,
) -> WindowPlan {
    let mut plan = WindowPlan::default();

    for (id, distance) in channels {
        let Some(metadata) = catalog.get(id) else {
            continue;
        };

        match travel_times.p_time(*distance, event.depth) {
            Ok(p_time) => {
                plan.windows.insert(id.clone(), window_for(event, params, p_time, *distance));
                plan.annotated.insert(id.clone(), metadata.with_p_arrival(p_time));
            }
            Err(e) => {
                tracing::warn!(channel = %id, distance_deg = distance, error = %e, "Travel time lookup failed");
                plan.failures.push(id.clone());
            }
        }
    }

    tracing::debug!(
        planned = plan.windows.len(),
        failed = plan.failures.len(),
        "Request windows planned"
    );

    plan
}

/// Attach P arrivals to catalog entries without computing windows
pub fn annotate_arrivals(
    channels: &[(ChannelId, f64)],
    catalog: &Catalog,
    event: &EarthquakeInfo,
    travel_times: &dyn TravelTimeModel,
) -> (Catalog, Vec<ChannelId>) {
    let mut annotated = Catalog::new();
    let mut failures = Vec::new();

    for (id, distance) in channels {
        let Some(metadata) = catalog.get(id) else {
            continue;
        };
        match travel_times.p_time(*distance, event.depth) {
            Ok(p_time) => {
                annotated.insert(id.clone(), metadata.with_p_arrival(p_time));
            }
            Err(e) => {
                tracing::warn!(channel = %id, error = %e, "Travel time lookup failed");
                failures.push(id.clone());
            }
        }
    }

    (annotated, failures)
}
