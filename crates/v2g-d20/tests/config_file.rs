//! Loading the EVSE setup from disk

mod common;

use std::io::Write;

use v2g_core::{ControlMode, MobilityNeedsMode, ServiceCategory};
use v2g_d20::{ConfigError, EvseSetupConfig, SessionConfig};

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(common::EVSE_TOML.as_bytes()).unwrap();

    let config = EvseSetupConfig::load(file.path()).unwrap();
    assert_eq!(config.evse_id, "DE*PNX*E12345*1");
    assert_eq!(
        config.supported_energy_services,
        vec![ServiceCategory::Ac, ServiceCategory::AcBpt]
    );
    assert!(config.ac_limits.has_discharge_limits());

    let session = SessionConfig::new(config);
    assert_eq!(session.dc_parameter_list.len(), 1);
    assert_eq!(session.dc_parameter_list[0].control_mode, ControlMode::Scheduled);
    assert_eq!(
        session.dc_parameter_list[0].mobility_needs_mode,
        MobilityNeedsMode::ProvidedByEvcc
    );
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EvseSetupConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn repository_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/evse.toml");
    let config = EvseSetupConfig::load(path).unwrap();
    assert!(!config.control_mobility_modes.is_empty());
}
