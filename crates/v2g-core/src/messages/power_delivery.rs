use serde::{Deserialize, Serialize};

use crate::datatypes::{BptChannel, EvseStatus, Header, Processing, Progress};
use crate::response_code::ResponseCode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerDeliveryRequest {
    pub header: Header,
    #[serde(default)]
    pub processing: Processing,
    pub charge_progress: Progress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpt_channel_selection: Option<BptChannel>,
}

impl PowerDeliveryRequest {
    pub fn new(header: Header, charge_progress: Progress) -> Self {
        Self {
            header,
            processing: Processing::Finished,
            charge_progress,
            bpt_channel_selection: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PowerDeliveryResponse {
    pub header: Header,
    pub response_code: ResponseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EvseStatus>,
}
