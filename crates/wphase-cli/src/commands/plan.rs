use crate::cli::PlanArgs;
use crate::output::OutputWriter;
use crate::output_types::{PlanOutput, PlannedChannel};
use crate::progress::{create_spinner, finish_success};
use anyhow::Result;
use tabled::Tabled;
use wphase_acquisition::AcquisitionPipeline;
use wphase_core::config::AcquisitionConfig;
use wphase_fdsn::FdsnDataselectClient;
use wphase_geo::DistanceCutoffPruner;

use super::{load_catalog, load_travel_times};

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Channel")]
    id: String,
    #[tabled(rename = "Distance (°)")]
    distance: String,
    #[tabled(rename = "P (s)")]
    p_arrival: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
}

pub fn execute(args: PlanArgs, config: &AcquisitionConfig, output: &OutputWriter) -> Result<()> {
    let event = args.event.to_event();
    let catalog = load_catalog(&args.inventory, config, output)?;
    let travel_times = load_travel_times(args.travel_times.as_deref())?;

    let pipeline = AcquisitionPipeline::new(
        FdsnDataselectClient::from_config(config),
        travel_times,
        DistanceCutoffPruner::new(config.distance_model.value),
        config.clone(),
    );

    let spinner = create_spinner("Planning request windows...", output.is_json());
    let plan = pipeline.plan(&event, &catalog);
    finish_success(&spinner, &format!("{} channel(s) selected", plan.channels.len()));

    let channels: Vec<PlannedChannel> = plan
        .channels
        .iter()
        .filter_map(|id| {
            let window = *plan.windows.get(id)?;
            Some(PlannedChannel {
                id: id.clone(),
                distance_deg: plan.distances.get(id).copied().unwrap_or_default(),
                p_arrival_secs: plan.annotated.get(id).and_then(|m| m.p_arrival),
                window,
            })
        })
        .collect();

    if output.is_json() {
        output.result(PlanOutput {
            catalog_channels: catalog.len(),
            in_range: plan.distances.len(),
            selected: channels.len(),
            travel_time_failures: plan.travel_time_failures,
            channels,
        })?;
        return Ok(());
    }

    output.section("Acquisition Plan");
    output.kv("Catalog channels", catalog.len());
    output.kv("Within distance range", plan.distances.len());
    output.kv("Selected after pruning", channels.len());

    if !plan.travel_time_failures.is_empty() {
        output.warning(format!(
            "No travel time for {} channel(s)",
            plan.travel_time_failures.len()
        ));
    }

    output.section("Channels");
    output.table(
        channels
            .into_iter()
            .map(|c| PlanRow {
                id: c.id.to_string(),
                distance: format!("{:.2}", c.distance_deg),
                p_arrival: c
                    .p_arrival_secs
                    .map(|p| format!("{:.1}", p))
                    .unwrap_or_else(|| "-".to_string()),
                start: c.window.start.format("%Y-%m-%dT%H:%M:%S").to_string(),
                end: c.window.end.format("%Y-%m-%dT%H:%M:%S").to_string(),
            })
            .collect(),
    );

    Ok(())
}
