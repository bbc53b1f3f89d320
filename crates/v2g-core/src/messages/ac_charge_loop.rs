//! AC_ChargeLoop request/response
//!
//! Both messages carry a control-mode payload with four alternatives. The
//! response must always use the alternative matching the request;
//! [`AcControlModeKind`] names the alternative without its data so the two
//! sides can be compared.

use serde::{Deserialize, Serialize};

use crate::datatypes::{
    ControlMode, DisplayParameters, EvseStatus, Header, PhasePower, RationalNumber,
    ServiceCategory,
};
use crate::response_code::ResponseCode;

// =============================================================================
// Alternative discriminant
// =============================================================================

/// Which of the four control-mode alternatives a message carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcControlModeKind {
    Scheduled,
    BptScheduled,
    Dynamic,
    BptDynamic,
}

impl AcControlModeKind {
    /// Control mode that must have been selected for this alternative
    pub fn control_mode(self) -> ControlMode {
        match self {
            Self::Scheduled | Self::BptScheduled => ControlMode::Scheduled,
            Self::Dynamic | Self::BptDynamic => ControlMode::Dynamic,
        }
    }

    /// Energy service that must have been selected for this alternative
    pub fn energy_service(self) -> ServiceCategory {
        match self {
            Self::Scheduled | Self::Dynamic => ServiceCategory::Ac,
            Self::BptScheduled | Self::BptDynamic => ServiceCategory::AcBpt,
        }
    }
}

// =============================================================================
// Request
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAcReqControlMode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_target_energy_request: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_max_energy_request: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_min_energy_request: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_max_charge_power: Option<PhasePower>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_min_charge_power: Option<PhasePower>,
    pub ev_present_active_power: PhasePower,
    #[serde(default)]
    pub ev_present_reactive_power: PhasePower,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BptScheduledAcReqControlMode {
    #[serde(flatten)]
    pub base: ScheduledAcReqControlMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_max_discharge_power: Option<PhasePower>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_min_discharge_power: Option<PhasePower>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicAcReqControlMode {
    /// Seconds until the planned departure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<u32>,
    pub ev_target_energy_request: RationalNumber,
    pub ev_max_energy_request: RationalNumber,
    pub ev_min_energy_request: RationalNumber,
    pub ev_max_charge_power: PhasePower,
    pub ev_min_charge_power: PhasePower,
    pub ev_present_active_power: PhasePower,
    #[serde(default)]
    pub ev_present_reactive_power: PhasePower,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BptDynamicAcReqControlMode {
    #[serde(flatten)]
    pub base: DynamicAcReqControlMode,
    pub ev_max_discharge_power: PhasePower,
    pub ev_min_discharge_power: PhasePower,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_max_v2x_energy_request: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_min_v2x_energy_request: Option<RationalNumber>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AcReqControlMode {
    Scheduled(ScheduledAcReqControlMode),
    BptScheduled(BptScheduledAcReqControlMode),
    Dynamic(DynamicAcReqControlMode),
    BptDynamic(BptDynamicAcReqControlMode),
}

impl AcReqControlMode {
    pub fn kind(&self) -> AcControlModeKind {
        match self {
            Self::Scheduled(_) => AcControlModeKind::Scheduled,
            Self::BptScheduled(_) => AcControlModeKind::BptScheduled,
            Self::Dynamic(_) => AcControlModeKind::Dynamic,
            Self::BptDynamic(_) => AcControlModeKind::BptDynamic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcChargeLoopRequest {
    pub header: Header,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_parameters: Option<DisplayParameters>,
    #[serde(default)]
    pub meter_info_requested: bool,
    pub control_mode: AcReqControlMode,
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAcResControlMode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_active_power: Option<PhasePower>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_reactive_power: Option<PhasePower>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_active_power: Option<PhasePower>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BptScheduledAcResControlMode {
    #[serde(flatten)]
    pub base: ScheduledAcResControlMode,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicAcResControlMode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_soc: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_soc: Option<i8>,
    /// Seconds the EV may take to acknowledge a changed target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_max_delay: Option<u16>,
    pub target_active_power: PhasePower,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_reactive_power: Option<PhasePower>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_active_power: Option<PhasePower>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BptDynamicAcResControlMode {
    #[serde(flatten)]
    pub base: DynamicAcResControlMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AcResControlMode {
    Scheduled(ScheduledAcResControlMode),
    BptScheduled(BptScheduledAcResControlMode),
    Dynamic(DynamicAcResControlMode),
    BptDynamic(BptDynamicAcResControlMode),
}

impl AcResControlMode {
    pub fn kind(&self) -> AcControlModeKind {
        match self {
            Self::Scheduled(_) => AcControlModeKind::Scheduled,
            Self::BptScheduled(_) => AcControlModeKind::BptScheduled,
            Self::Dynamic(_) => AcControlModeKind::Dynamic,
            Self::BptDynamic(_) => AcControlModeKind::BptDynamic,
        }
    }

    /// Present active power reported back to the EV, if any
    pub fn present_active_power(&self) -> Option<&PhasePower> {
        match self {
            Self::Scheduled(m) => m.present_active_power.as_ref(),
            Self::BptScheduled(m) => m.base.present_active_power.as_ref(),
            Self::Dynamic(m) => m.present_active_power.as_ref(),
            Self::BptDynamic(m) => m.base.present_active_power.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcChargeLoopResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EvseStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_frequency: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_mode: Option<AcResControlMode>,
}
