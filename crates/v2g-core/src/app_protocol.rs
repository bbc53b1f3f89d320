//! SupportedAppProtocol handshake
//!
//! First exchange on a V2G connection: the EV lists the protocols it speaks,
//! the EVSE answers with the schema it picked.

use serde::{Deserialize, Serialize};

/// Namespace announced by ISO 15118-20 AC capable vehicles
pub const ISO_15118_20_AC_NAMESPACE: &str = "urn:iso:std:iso:15118:-20:AC";

/// One protocol entry offered by the EV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppProtocol {
    pub protocol_namespace: String,
    pub version_number_major: u32,
    pub version_number_minor: u32,
    pub schema_id: u8,
    /// 1 is the most preferred
    pub priority: u8,
}

impl AppProtocol {
    pub fn new(namespace: impl Into<String>, major: u32, minor: u32) -> Self {
        Self {
            protocol_namespace: namespace.into(),
            version_number_major: major,
            version_number_minor: minor,
            schema_id: 0,
            priority: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedAppProtocolRequest {
    pub app_protocol: Vec<AppProtocol>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum AppProtocolResponseCode {
    OkSuccessfulNegotiation = 0,
    OkSuccessfulNegotiationWithMinorDeviation = 1,
    FailedNoNegotiation = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedAppProtocolResponse {
    pub response_code: AppProtocolResponseCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<u8>,
}

impl SupportedAppProtocolResponse {
    pub fn failed() -> Self {
        Self {
            response_code: AppProtocolResponseCode::FailedNoNegotiation,
            schema_id: None,
        }
    }
}

/// Pick the EV's most preferred offer that the EVSE supports.
///
/// An offer matches when namespace and major version agree; a differing
/// minor version is accepted as a minor deviation.
pub fn negotiate(
    request: &SupportedAppProtocolRequest,
    supported: &[AppProtocol],
) -> SupportedAppProtocolResponse {
    let mut offers: Vec<&AppProtocol> = request.app_protocol.iter().collect();
    offers.sort_by_key(|offer| offer.priority);

    for offer in offers {
        let matching = supported.iter().find(|s| {
            s.protocol_namespace == offer.protocol_namespace
                && s.version_number_major == offer.version_number_major
        });

        if let Some(ours) = matching {
            let response_code = if ours.version_number_minor == offer.version_number_minor {
                AppProtocolResponseCode::OkSuccessfulNegotiation
            } else {
                AppProtocolResponseCode::OkSuccessfulNegotiationWithMinorDeviation
            };
            return SupportedAppProtocolResponse {
                response_code,
                schema_id: Some(offer.schema_id),
            };
        }
    }

    SupportedAppProtocolResponse::failed()
}
