//! ISO 15118-20 request/response messages
//!
//! Each message lives in its own module; [`Request`] and [`Response`] are the
//! decoded variants handed between the transport and the state machine.

mod ac_charge_loop;
mod ac_charge_parameter_discovery;
mod power_delivery;
mod session_setup;
mod session_stop;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use ac_charge_loop::{
    AcChargeLoopRequest, AcChargeLoopResponse, AcControlModeKind, AcReqControlMode,
    AcResControlMode, BptDynamicAcReqControlMode, BptDynamicAcResControlMode,
    BptScheduledAcReqControlMode, BptScheduledAcResControlMode, DynamicAcReqControlMode,
    DynamicAcResControlMode, ScheduledAcReqControlMode, ScheduledAcResControlMode,
};
pub use ac_charge_parameter_discovery::{
    AcChargeParameterDiscoveryRequest, AcChargeParameterDiscoveryResponse,
};
pub use power_delivery::{PowerDeliveryRequest, PowerDeliveryResponse};
pub use session_setup::{SessionSetupRequest, SessionSetupResponse};
pub use session_stop::{SessionStopRequest, SessionStopResponse};

use crate::datatypes::Header;
use crate::response_code::ResponseCode;

/// Message kind, shared by a request and its response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    SessionSetup,
    AcChargeParameterDiscovery,
    PowerDelivery,
    AcChargeLoop,
    SessionStop,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SessionSetup => "SessionSetup",
            Self::AcChargeParameterDiscovery => "AC_ChargeParameterDiscovery",
            Self::PowerDelivery => "PowerDelivery",
            Self::AcChargeLoop => "AC_ChargeLoop",
            Self::SessionStop => "SessionStop",
        };
        f.write_str(s)
    }
}

/// A decoded inbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    SessionSetup(SessionSetupRequest),
    AcChargeParameterDiscovery(AcChargeParameterDiscoveryRequest),
    PowerDelivery(PowerDeliveryRequest),
    AcChargeLoop(AcChargeLoopRequest),
    SessionStop(SessionStopRequest),
}

impl Request {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::SessionSetup(_) => MessageType::SessionSetup,
            Self::AcChargeParameterDiscovery(_) => MessageType::AcChargeParameterDiscovery,
            Self::PowerDelivery(_) => MessageType::PowerDelivery,
            Self::AcChargeLoop(_) => MessageType::AcChargeLoop,
            Self::SessionStop(_) => MessageType::SessionStop,
        }
    }

    pub fn header(&self) -> &Header {
        match self {
            Self::SessionSetup(req) => &req.header,
            Self::AcChargeParameterDiscovery(req) => &req.header,
            Self::PowerDelivery(req) => &req.header,
            Self::AcChargeLoop(req) => &req.header,
            Self::SessionStop(req) => &req.header,
        }
    }
}

/// An outbound message ready for encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    SessionSetup(SessionSetupResponse),
    AcChargeParameterDiscovery(AcChargeParameterDiscoveryResponse),
    PowerDelivery(PowerDeliveryResponse),
    AcChargeLoop(AcChargeLoopResponse),
    SessionStop(SessionStopResponse),
}

impl Response {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::SessionSetup(_) => MessageType::SessionSetup,
            Self::AcChargeParameterDiscovery(_) => MessageType::AcChargeParameterDiscovery,
            Self::PowerDelivery(_) => MessageType::PowerDelivery,
            Self::AcChargeLoop(_) => MessageType::AcChargeLoop,
            Self::SessionStop(_) => MessageType::SessionStop,
        }
    }

    pub fn response_code(&self) -> ResponseCode {
        match self {
            Self::SessionSetup(res) => res.response_code,
            Self::AcChargeParameterDiscovery(res) => res.response_code,
            Self::PowerDelivery(res) => res.response_code,
            Self::AcChargeLoop(res) => res.response_code,
            Self::SessionStop(res) => res.response_code,
        }
    }

    pub fn header(&self) -> &Header {
        match self {
            Self::SessionSetup(res) => &res.header,
            Self::AcChargeParameterDiscovery(res) => &res.header,
            Self::PowerDelivery(res) => &res.header,
            Self::AcChargeLoop(res) => &res.header,
            Self::SessionStop(res) => &res.header,
        }
    }

    /// Response of the same kind as the offending request, carrying
    /// `FAILED_SequenceError` and nothing else
    pub fn sequence_error(request_type: MessageType, header: Header) -> Self {
        let response_code = ResponseCode::FailedSequenceError;
        match request_type {
            MessageType::SessionSetup => Self::SessionSetup(SessionSetupResponse {
                header,
                response_code,
                ..Default::default()
            }),
            MessageType::AcChargeParameterDiscovery => {
                Self::AcChargeParameterDiscovery(AcChargeParameterDiscoveryResponse {
                    header,
                    response_code,
                    ..Default::default()
                })
            }
            MessageType::PowerDelivery => Self::PowerDelivery(PowerDeliveryResponse {
                header,
                response_code,
                ..Default::default()
            }),
            MessageType::AcChargeLoop => Self::AcChargeLoop(AcChargeLoopResponse {
                header,
                response_code,
                ..Default::default()
            }),
            MessageType::SessionStop => Self::SessionStop(SessionStopResponse {
                header,
                response_code,
            }),
        }
    }
}

macro_rules! impl_from_message {
    ($sum:ident, $variant:ident, $msg:ty) => {
        impl From<$msg> for $sum {
            fn from(msg: $msg) -> Self {
                $sum::$variant(msg)
            }
        }
    };
}

impl_from_message!(Request, SessionSetup, SessionSetupRequest);
impl_from_message!(Request, AcChargeParameterDiscovery, AcChargeParameterDiscoveryRequest);
impl_from_message!(Request, PowerDelivery, PowerDeliveryRequest);
impl_from_message!(Request, AcChargeLoop, AcChargeLoopRequest);
impl_from_message!(Request, SessionStop, SessionStopRequest);

impl_from_message!(Response, SessionSetup, SessionSetupResponse);
impl_from_message!(Response, AcChargeParameterDiscovery, AcChargeParameterDiscoveryResponse);
impl_from_message!(Response, PowerDelivery, PowerDeliveryResponse);
impl_from_message!(Response, AcChargeLoop, AcChargeLoopResponse);
impl_from_message!(Response, SessionStop, SessionStopResponse);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{ChargingSession, SessionId};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sequence_error_matches_request_type() {
        let header = Header::new(SessionId([1; 8]));
        for ty in [
            MessageType::SessionSetup,
            MessageType::AcChargeParameterDiscovery,
            MessageType::PowerDelivery,
            MessageType::AcChargeLoop,
            MessageType::SessionStop,
        ] {
            let res = Response::sequence_error(ty, header.clone());
            assert_eq!(res.message_type(), ty);
            assert_eq!(res.response_code(), ResponseCode::FailedSequenceError);
            assert_eq!(res.header(), &header);
        }
    }

    #[test]
    fn test_sequence_error_leaves_payload_empty() {
        let res = Response::sequence_error(MessageType::AcChargeLoop, Header::default());
        match res {
            Response::AcChargeLoop(res) => {
                assert!(res.control_mode.is_none());
                assert!(res.target_frequency.is_none());
                assert!(res.status.is_none());
            }
            other => panic!("Expected AC_ChargeLoop response, got {:?}", other),
        }
    }

    #[test]
    fn test_request_json_is_tagged() {
        let req = Request::from(SessionStopRequest {
            header: Header::default(),
            charging_session: ChargingSession::Terminate,
            ev_termination_code: None,
            ev_termination_explanation: None,
        });

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "SessionStop");
        assert_eq!(json["charging_session"], "Terminate");

        let parsed: Request = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.message_type(), MessageType::SessionStop);
    }
}
