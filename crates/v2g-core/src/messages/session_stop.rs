use serde::{Deserialize, Serialize};

use crate::datatypes::{ChargingSession, Header};
use crate::response_code::ResponseCode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStopRequest {
    pub header: Header,
    pub charging_session: ChargingSession,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_termination_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_termination_explanation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStopResponse {
    pub header: Header,
    pub response_code: ResponseCode,
}
