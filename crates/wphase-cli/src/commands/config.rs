use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigOutput};
use anyhow::Result;
use tabled::Tabled;
use wphase_core::config::AcquisitionConfig;

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: String,
}

/// Show every configuration value with the layer it came from
pub fn execute(config: &AcquisitionConfig, output: &OutputWriter) -> Result<()> {
    let inspection_map = config.to_inspection_map();

    if output.is_json() {
        let values = inspection_map
            .into_iter()
            .map(|(key, (value, source))| (key, ConfigEntry { value, source: format!("{:?}", source) }))
            .collect();
        output.result(ConfigOutput { values })?;
        return Ok(());
    }

    output.section("Configuration Values");

    // BTreeMap iteration keeps keys sorted
    let rows: Vec<ConfigRow> = inspection_map
        .into_iter()
        .map(|(key, (value, source))| ConfigRow { key, value, source: format!("{:?}", source) })
        .collect();
    output.table(rows);

    output.section("Configuration Precedence");
    output.info("CLI arguments > Environment variables > Config file > Defaults");

    Ok(())
}
