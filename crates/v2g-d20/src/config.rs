//! EVSE setup configuration and per-session derived configuration
//!
//! [`EvseSetupConfig`] is what the operator writes (TOML). [`SessionConfig`]
//! is built from it once per session and adds the parameter lists offered
//! during service discovery.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use v2g_core::{
    BptChannel, ControlMode, DcConnector, GeneratorMode, McsConnector, MobilityNeedsMode,
    PhasePower, Pricing, RationalNumber, ServiceCategory,
};

use crate::error::ConfigError;
use crate::timeout::TimeoutKind;

// =============================================================================
// Limits
// =============================================================================

/// AC power limits of the charger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcTransferLimits {
    pub max_charge_power: PhasePower,
    pub min_charge_power: PhasePower,
    /// Grid frequency in Hz
    #[serde(default = "default_nominal_frequency")]
    pub nominal_frequency: f32,
    /// Power currently delivered, reported back in every AC_ChargeLoopRes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_active_power: Option<PhasePower>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discharge_power: Option<PhasePower>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discharge_power: Option<PhasePower>,
}

fn default_nominal_frequency() -> f32 {
    50.0
}

impl Default for AcTransferLimits {
    fn default() -> Self {
        Self {
            max_charge_power: PhasePower::default(),
            min_charge_power: PhasePower::default(),
            nominal_frequency: default_nominal_frequency(),
            present_active_power: None,
            max_discharge_power: None,
            min_discharge_power: None,
        }
    }
}

impl AcTransferLimits {
    pub fn has_discharge_limits(&self) -> bool {
        self.max_discharge_power.is_some() && self.min_discharge_power.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    pub max: RationalNumber,
    pub min: RationalNumber,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DcChargeLimits {
    pub power: Limit,
    pub current: Limit,
    pub voltage: Limit,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DcDischargeLimits {
    pub power: Limit,
    pub current: Limit,
}

/// DC limits, only carried through to service discovery here
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DcTransferLimits {
    #[serde(default)]
    pub charge_limits: DcChargeLimits,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discharge_limits: Option<DcDischargeLimits>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_ramp_limit: Option<RationalNumber>,
}

// =============================================================================
// Services
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authorization {
    Eim,
    PnC,
}

/// One control mode the charger offers, paired with who provides mobility needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMobilityNeedsModes {
    pub control_mode: ControlMode,
    pub mobility_mode: MobilityNeedsMode,
}

impl ControlMobilityNeedsModes {
    /// Scheduled mode only supports EV-provided mobility needs
    fn normalized_mobility_mode(&self) -> MobilityNeedsMode {
        if self.control_mode == ControlMode::Scheduled
            && self.mobility_mode == MobilityNeedsMode::ProvidedBySecc
        {
            info!("Scheduled mode only supports ProvidedByEvcc, overriding mobility needs mode");
            return MobilityNeedsMode::ProvidedByEvcc;
        }
        self.mobility_mode
    }
}

impl Default for ControlMobilityNeedsModes {
    fn default() -> Self {
        Self {
            control_mode: ControlMode::Scheduled,
            mobility_mode: MobilityNeedsMode::ProvidedByEvcc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcParameterList {
    pub connector: DcConnector,
    pub control_mode: ControlMode,
    pub mobility_needs_mode: MobilityNeedsMode,
    pub pricing: Pricing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcBptParameterList {
    pub base: DcParameterList,
    pub bpt_channel: BptChannel,
    pub generator_mode: GeneratorMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct McsParameterList {
    pub connector: McsConnector,
    pub control_mode: ControlMode,
    pub mobility_needs_mode: MobilityNeedsMode,
    pub pricing: Pricing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct McsBptParameterList {
    pub base: McsParameterList,
    pub bpt_channel: BptChannel,
    pub generator_mode: GeneratorMode,
}

// =============================================================================
// Timeouts
// =============================================================================

/// Duration in milliseconds for each protocol timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_sequence_ms")]
    pub sequence_ms: u64,
    #[serde(default = "default_performance_ms")]
    pub performance_ms: u64,
    #[serde(default = "default_ongoing_ms")]
    pub ongoing_ms: u64,
    #[serde(default = "default_contactor_ms")]
    pub contactor_ms: u64,
}

fn default_sequence_ms() -> u64 {
    60_000
}

fn default_performance_ms() -> u64 {
    4_500
}

fn default_ongoing_ms() -> u64 {
    55_000
}

fn default_contactor_ms() -> u64 {
    3_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            sequence_ms: default_sequence_ms(),
            performance_ms: default_performance_ms(),
            ongoing_ms: default_ongoing_ms(),
            contactor_ms: default_contactor_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn duration_ms(&self, kind: TimeoutKind) -> u64 {
        match kind {
            TimeoutKind::Sequence => self.sequence_ms,
            TimeoutKind::Performance => self.performance_ms,
            TimeoutKind::Ongoing => self.ongoing_ms,
            TimeoutKind::Contactor => self.contactor_ms,
        }
    }
}

// =============================================================================
// Setup config
// =============================================================================

/// Operator-provided EVSE configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvseSetupConfig {
    pub evse_id: String,
    #[serde(default)]
    pub enable_certificate_install_service: bool,
    #[serde(default = "default_authorization_services")]
    pub authorization_services: Vec<Authorization>,
    pub supported_energy_services: Vec<ServiceCategory>,
    /// Value-added service ids
    #[serde(default)]
    pub supported_vas_services: Vec<u16>,
    #[serde(default)]
    pub ac_limits: AcTransferLimits,
    #[serde(default)]
    pub dc_limits: DcTransferLimits,
    /// Empty means scheduled mode with EV-provided mobility needs
    #[serde(default)]
    pub control_mobility_modes: Vec<ControlMobilityNeedsModes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_protocol: Option<String>,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

fn default_authorization_services() -> Vec<Authorization> {
    vec![Authorization::Eim]
}

impl EvseSetupConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.evse_id.is_empty() {
            return Err(ConfigError::Invalid("evse_id must not be empty".into()));
        }
        if self.supported_energy_services.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one energy service must be supported".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Session config
// =============================================================================

/// Configuration fixed for the lifetime of one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub evse_id: String,
    pub cert_install_service: bool,
    pub authorization_services: Vec<Authorization>,
    pub supported_energy_transfer_services: Vec<ServiceCategory>,
    pub supported_vas_services: Vec<u16>,

    pub ac_limits: AcTransferLimits,
    pub dc_limits: DcTransferLimits,

    pub supported_control_mobility_modes: Vec<ControlMobilityNeedsModes>,
    pub dc_parameter_list: Vec<DcParameterList>,
    pub dc_bpt_parameter_list: Vec<DcBptParameterList>,
    pub mcs_parameter_list: Vec<McsParameterList>,
    pub mcs_bpt_parameter_list: Vec<McsBptParameterList>,

    pub custom_protocol: Option<String>,
    pub timeouts: TimeoutConfig,
}

impl SessionConfig {
    pub fn new(config: EvseSetupConfig) -> Self {
        let services = &config.supported_energy_services;

        let dc_bpt_offered = services
            .iter()
            .any(|s| matches!(s, ServiceCategory::DcBpt | ServiceCategory::McsBpt));
        if dc_bpt_offered && config.dc_limits.discharge_limits.is_none() {
            warn!(
                "Energy services contain DC_BPT or MCS_BPT but no DC discharge limits are \
                 configured, sessions may be shut down"
            );
        }

        if services.contains(&ServiceCategory::AcBpt) && !config.ac_limits.has_discharge_limits() {
            warn!(
                "Energy services contain AC_BPT but no AC discharge limits are configured, \
                 sessions may be shut down"
            );
        }

        let mut modes = config.control_mobility_modes;
        if modes.is_empty() {
            warn!("No control modes configured, defaulting to scheduled mode");
            modes.push(ControlMobilityNeedsModes::default());
        }

        let dc_parameter_list: Vec<DcParameterList> = modes
            .iter()
            .map(|mode| DcParameterList {
                connector: DcConnector::Extended,
                control_mode: mode.control_mode,
                mobility_needs_mode: mode.normalized_mobility_mode(),
                pricing: Pricing::NoPricing,
            })
            .collect();

        let dc_bpt_parameter_list = dc_parameter_list
            .iter()
            .map(|&base| DcBptParameterList {
                base,
                bpt_channel: BptChannel::Unified,
                generator_mode: GeneratorMode::GridFollowing,
            })
            .collect();

        let mcs_parameter_list: Vec<McsParameterList> = dc_parameter_list
            .iter()
            .map(|dc| McsParameterList {
                connector: McsConnector::Mcs,
                control_mode: dc.control_mode,
                mobility_needs_mode: dc.mobility_needs_mode,
                pricing: dc.pricing,
            })
            .collect();

        let mcs_bpt_parameter_list = mcs_parameter_list
            .iter()
            .map(|&base| McsBptParameterList {
                base,
                bpt_channel: BptChannel::Unified,
                generator_mode: GeneratorMode::GridFollowing,
            })
            .collect();

        Self {
            evse_id: config.evse_id,
            cert_install_service: config.enable_certificate_install_service,
            authorization_services: config.authorization_services,
            supported_energy_transfer_services: config.supported_energy_services,
            supported_vas_services: config.supported_vas_services,
            ac_limits: config.ac_limits,
            dc_limits: config.dc_limits,
            supported_control_mobility_modes: modes,
            dc_parameter_list,
            dc_bpt_parameter_list,
            mcs_parameter_list,
            mcs_bpt_parameter_list,
            custom_protocol: config.custom_protocol,
            timeouts: config.timeouts,
        }
    }
}
