//! Integration tests for layered acquisition configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;
use wphase_core::config::{AcquisitionConfig, CliConfigOverrides, ConfigSource};
use wphase_core::models::DistanceModel;

const ENV_KEYS: &[&str] = &[
    "WPHASE_SERVER",
    "WPHASE_BULK_CHUNK_LEN",
    "WPHASE_PRUNE_CUTOFFS",
    "WPHASE_DIST_RANGE",
    "WPHASE_DECIMATE",
    "WPHASE_LOCATION_CODES",
    "WPHASE_DISTANCE_MODEL",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_default_configuration() {
    let config = AcquisitionConfig::with_defaults();

    assert_eq!(config.server.value, "http://service.iris.edu");
    assert_eq!(config.server.source, ConfigSource::Default);
    assert_eq!(config.dist_range.value, (5.0, 90.0));
    assert!(config.add_ptime.value);
    assert_eq!(config.distance_model.value, DistanceModel::Ellipsoidal);

    let filters = config.catalog_filters();
    assert_eq!(filters.sampling_rates, Some(vec![1.0, 20.0, 40.0, 50.0]));
    assert_eq!(filters.channel_codes, Some(vec!["BH".to_string(), "LH".to_string()]));
    assert_eq!(filters.location_codes, None);
}

#[test]
fn test_partial_file_configuration() {
    let file = config_file(
        r#"
wp_tw_factor = 12.5
# Only override the window factor, leave others as defaults
"#,
    );

    let config = AcquisitionConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.wp_tw_factor.value, 12.5);
    assert_eq!(config.wp_tw_factor.source, ConfigSource::File);
    assert_eq!(config.t_before_p.value, 1500.0);
    assert_eq!(config.t_before_p.source, ConfigSource::Default);
    assert_eq!(config.window_params().wp_tw_factor, 12.5);
}

#[test]
fn test_missing_file_is_config_error() {
    let result = AcquisitionConfig::with_defaults().load_from_file("/nonexistent/wphase.toml");
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("WPHASE_SERVER", "http://env-archive:8080");
    env::set_var("WPHASE_BULK_CHUNK_LEN", "75");
    env::set_var("WPHASE_PRUNE_CUTOFFS", "none");
    env::set_var("WPHASE_LOCATION_CODES", "00,--");

    let file = config_file(
        r#"
server = "http://file-archive:8080"
bulk_chunk_len = 100
prune_cutoffs = [2.0, 4.0]
"#,
    );

    let config = AcquisitionConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.server.value, "http://env-archive:8080");
    assert_eq!(config.server.source, ConfigSource::Environment);
    assert_eq!(config.bulk_chunk_len.value, 75);
    assert_eq!(config.prune_cutoffs.value, None);
    assert_eq!(config.prune_cutoffs.source, ConfigSource::Environment);
    assert_eq!(
        config.location_codes.value,
        Some(vec!["00".to_string(), String::new()])
    );

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("WPHASE_BULK_CHUNK_LEN", "lots");
    env::set_var("WPHASE_DIST_RANGE", "5");
    env::set_var("WPHASE_DECIMATE", "sometimes");

    let config = AcquisitionConfig::with_defaults().load_from_env();

    assert_eq!(config.bulk_chunk_len.value, 200);
    assert_eq!(config.bulk_chunk_len.source, ConfigSource::Default);
    assert_eq!(config.dist_range.value, (5.0, 90.0));
    assert!(config.decimate.value);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_everything() {
    clear_env();
    env::set_var("WPHASE_DISTANCE_MODEL", "spherical");
    env::set_var("WPHASE_DIST_RANGE", "10,80");

    let file = config_file("dist_range = [20.0, 70.0]");

    let mut config = AcquisitionConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    config.update_from_cli(CliConfigOverrides {
        dist_range: Some((30.0, 60.0)),
        distance_model: Some(DistanceModel::Ellipsoidal),
        reject_incomplete: true,
        ..Default::default()
    });

    assert_eq!(config.dist_range.value, (30.0, 60.0));
    assert_eq!(config.dist_range.source, ConfigSource::Cli);
    assert_eq!(config.distance_model.value, DistanceModel::Ellipsoidal);
    assert!(config.reject_incomplete.value);
    assert!(config.validate().is_ok());

    clear_env();
}
