use serde::{Deserialize, Serialize};

use crate::datatypes::{Header, PhasePower, RationalNumber};
use crate::response_code::ResponseCode;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcChargeParameterDiscoveryRequest {
    pub header: Header,
    pub ev_max_charge_power: PhasePower,
    pub ev_min_charge_power: PhasePower,
    /// Present only when AC_BPT was selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_max_discharge_power: Option<PhasePower>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_min_discharge_power: Option<PhasePower>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcChargeParameterDiscoveryResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evse_max_charge_power: Option<PhasePower>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evse_min_charge_power: Option<PhasePower>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evse_nominal_frequency: Option<RationalNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evse_max_discharge_power: Option<PhasePower>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evse_min_discharge_power: Option<PhasePower>,
}
