use serde::{Deserialize, Serialize};

use crate::datatypes::Header;
use crate::response_code::ResponseCode;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSetupRequest {
    pub header: Header,
    /// EVCC identifier (MAC address or EMAID)
    pub evcc_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSetupResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    pub evse_id: String,
}
