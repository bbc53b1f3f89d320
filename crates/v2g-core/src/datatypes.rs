//! Shared ISO 15118-20 datatypes
//!
//! Enumerations and small value types referenced by more than one message.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Session identity
// =============================================================================

/// 8-byte session identifier assigned by the EVSE in SessionSetup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub [u8; 8]);

impl SessionId {
    pub const LEN: usize = 8;

    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl From<[u8; 8]> for SessionId {
    fn from(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

/// Message header present in every -20 request and response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Session the message belongs to
    pub session_id: SessionId,
    /// Seconds since the Unix epoch at which the message was created
    pub timestamp: u64,
}

impl Header {
    /// Header stamped with the current wall-clock time
    pub fn new(session_id: SessionId) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            session_id,
            timestamp: u64::try_from(now).unwrap_or_default(),
        }
    }
}

// =============================================================================
// Numbers
// =============================================================================

/// Fixed-point number on the wire: `value * 10^exponent`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RationalNumber {
    pub value: i16,
    pub exponent: i8,
}

/// Finest resolution produced by [`RationalNumber::from_f32`]
const MIN_EXPONENT: i8 = -3;

impl RationalNumber {
    pub const ZERO: Self = Self {
        value: 0,
        exponent: 0,
    };

    pub const fn new(value: i16, exponent: i8) -> Self {
        Self { value, exponent }
    }

    /// Convert a float, picking the exponent that keeps the most precision
    /// while the mantissa still fits in an `i16`.
    ///
    /// Non-finite input maps to zero.
    pub fn from_f32(input: f32) -> Self {
        if !input.is_finite() {
            return Self::ZERO;
        }

        let limit = f64::from(i16::MAX);
        let mut scaled = f64::from(input);
        let mut exponent: i8 = 0;

        while scaled.abs() > limit {
            scaled /= 10.0;
            exponent += 1;
        }

        while exponent > MIN_EXPONENT
            && (scaled - scaled.round()).abs() > 1e-4
            && (scaled * 10.0).abs() <= limit
        {
            scaled *= 10.0;
            exponent -= 1;
        }

        Self {
            value: scaled.round().clamp(f64::from(i16::MIN), limit) as i16,
            exponent,
        }
    }

    pub fn to_f32(self) -> f32 {
        f32::from(self.value) * 10f32.powi(i32::from(self.exponent))
    }
}

impl From<f32> for RationalNumber {
    fn from(value: f32) -> Self {
        Self::from_f32(value)
    }
}

/// A power quantity given per phase; `l2`/`l3` are absent on single-phase setups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasePower {
    pub l1: RationalNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l2: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l3: Option<RationalNumber>,
}

impl PhasePower {
    pub fn single_phase(l1: RationalNumber) -> Self {
        Self {
            l1,
            l2: None,
            l3: None,
        }
    }

    pub fn three_phase(l1: RationalNumber, l2: RationalNumber, l3: RationalNumber) -> Self {
        Self {
            l1,
            l2: Some(l2),
            l3: Some(l3),
        }
    }

    /// Sum over all present phases
    pub fn total(&self) -> f32 {
        [Some(self.l1), self.l2, self.l3]
            .into_iter()
            .flatten()
            .map(RationalNumber::to_f32)
            .sum()
    }
}

// =============================================================================
// Service negotiation enumerations
// =============================================================================

/// How power targets are computed during the charge loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlMode {
    Scheduled,
    Dynamic,
}

/// Which side provides the mobility needs (departure time, target SoC, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MobilityNeedsMode {
    ProvidedByEvcc,
    ProvidedBySecc,
}

/// Energy transfer service category (ServiceID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ServiceCategory {
    Ac = 1,
    Dc = 2,
    Wpt = 3,
    DcAcdp = 4,
    AcBpt = 5,
    DcBpt = 6,
    DcAcdpBpt = 7,
    Mcs = 8,
    McsBpt = 9,
}

impl ServiceCategory {
    /// ServiceID as sent on the wire
    pub fn id(self) -> u16 {
        self as u16
    }

    /// Whether the service allows the vehicle to discharge
    pub fn is_bpt(self) -> bool {
        matches!(
            self,
            Self::AcBpt | Self::DcBpt | Self::DcAcdpBpt | Self::McsBpt
        )
    }

    pub fn is_ac(self) -> bool {
        matches!(self, Self::Ac | Self::AcBpt)
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ac => "AC",
            Self::Dc => "DC",
            Self::Wpt => "WPT",
            Self::DcAcdp => "DC_ACDP",
            Self::AcBpt => "AC_BPT",
            Self::DcBpt => "DC_BPT",
            Self::DcAcdpBpt => "DC_ACDP_BPT",
            Self::Mcs => "MCS",
            Self::McsBpt => "MCS_BPT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pricing {
    NoPricing,
    AbsolutePricing,
    PriceLevels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DcConnector {
    Core,
    Extended,
    Dual2,
    Dual4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum McsConnector {
    Mcs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BptChannel {
    Unified,
    Separated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorMode {
    GridFollowing,
    GridForming,
}

// =============================================================================
// Charge-loop enumerations
// =============================================================================

/// ChargeProgress field of PowerDeliveryReq
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Progress {
    Start,
    Stop,
    Standby,
    ScheduleRenegotiation,
}

/// EVProcessing field, used by messages that can be repeated while ongoing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Processing {
    #[default]
    Finished,
    Ongoing,
    OngoingWaitingForCustomerInteraction,
}

/// Notification the EVSE attaches to its status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvseNotification {
    Pause,
    ExitStandby,
    Terminate,
    ScheduleRenegotiation,
    ServiceRenegotiation,
    MeteringConfirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvseStatus {
    /// Seconds the EV may take to react to the notification
    pub notification_max_delay: u16,
    pub evse_notification: EvseNotification,
}

/// ChargingSession field of SessionStopReq
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingSession {
    Terminate,
    Pause,
    ServiceRenegotiation,
}

/// Optional HMI values the vehicle reports during the charge loop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub present_soc: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_soc: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_soc: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_soc: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_time_to_min_soc: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_time_to_target_soc: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_time_to_max_soc: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_energy_capacity: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inlet_hot: Option<bool>,
}
