//! ISO 15118-20 ResponseCode

use std::fmt;

use serde::{Deserialize, Serialize};

/// ResponseCode carried by every -20 response
///
/// Declaration order is the wire order and is significant: every code at or
/// after [`ResponseCode::Failed`] is terminal for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResponseCode {
    Ok = 0,
    OkCertificateExpiresSoon,
    OkNewSessionEstablished,
    OkOldSessionJoined,
    OkPowerToleranceConfirmed,
    WarningAuthorizationSelectionInvalid,
    WarningCertificateExpired,
    WarningCertificateNotYetValid,
    WarningCertificateRevoked,
    WarningCertificateValidationError,
    WarningChallengeInvalid,
    WarningEimAuthorizationFailure,
    WarningEmspUnknown,
    WarningEvPowerProfileViolation,
    WarningGeneralPnCAuthorizationError,
    WarningNoCertificateAvailable,
    WarningNoContractMatchingPcidFound,
    WarningPowerToleranceNotConfirmed,
    WarningScheduleRenegotiationFailed,
    WarningStandbyNotAllowed,
    WarningWpt,
    Failed,
    FailedAssociationError,
    FailedContactorError,
    FailedEvPowerProfileInvalid,
    FailedEvPowerProfileViolation,
    FailedMeteringSignatureNotValid,
    FailedNoEnergyTransferServiceSelected,
    FailedNoServiceRenegotiationSupported,
    FailedPauseNotAllowed,
    FailedPowerDeliveryNotApplied,
    FailedPowerToleranceNotConfirmed,
    FailedScheduleRenegotiation,
    FailedScheduleSelectionInvalid,
    FailedSequenceError,
    FailedServiceIdInvalid,
    FailedServiceSelectionInvalid,
    FailedSignatureError,
    FailedUnknownSession,
    FailedWrongChargeParameter,
}

impl ResponseCode {
    /// Whether the code ends the session
    pub fn is_failure(self) -> bool {
        self >= Self::Failed
    }

    pub fn is_warning(self) -> bool {
        self >= Self::WarningAuthorizationSelectionInvalid && self < Self::Failed
    }
}

impl Default for ResponseCode {
    fn default() -> Self {
        Self::Ok
    }
}

impl From<ResponseCode> for u8 {
    fn from(code: ResponseCode) -> Self {
        code as u8
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "OK",
            Self::OkCertificateExpiresSoon => "OK_CertificateExpiresSoon",
            Self::OkNewSessionEstablished => "OK_NewSessionEstablished",
            Self::OkOldSessionJoined => "OK_OldSessionJoined",
            Self::OkPowerToleranceConfirmed => "OK_PowerToleranceConfirmed",
            Self::WarningAuthorizationSelectionInvalid => "WARNING_AuthorizationSelectionInvalid",
            Self::WarningCertificateExpired => "WARNING_CertificateExpired",
            Self::WarningCertificateNotYetValid => "WARNING_CertificateNotYetValid",
            Self::WarningCertificateRevoked => "WARNING_CertificateRevoked",
            Self::WarningCertificateValidationError => "WARNING_CertificateValidationError",
            Self::WarningChallengeInvalid => "WARNING_ChallengeInvalid",
            Self::WarningEimAuthorizationFailure => "WARNING_EIMAuthorizationFailure",
            Self::WarningEmspUnknown => "WARNING_eMSPUnknown",
            Self::WarningEvPowerProfileViolation => "WARNING_EVPowerProfileViolation",
            Self::WarningGeneralPnCAuthorizationError => "WARNING_GeneralPnCAuthorizationError",
            Self::WarningNoCertificateAvailable => "WARNING_NoCertificateAvailable",
            Self::WarningNoContractMatchingPcidFound => "WARNING_NoContractMatchingPCIDFound",
            Self::WarningPowerToleranceNotConfirmed => "WARNING_PowerToleranceNotConfirmed",
            Self::WarningScheduleRenegotiationFailed => "WARNING_ScheduleRenegotiationFailed",
            Self::WarningStandbyNotAllowed => "WARNING_StandbyNotAllowed",
            Self::WarningWpt => "WARNING_WPT",
            Self::Failed => "FAILED",
            Self::FailedAssociationError => "FAILED_AssociationError",
            Self::FailedContactorError => "FAILED_ContactorError",
            Self::FailedEvPowerProfileInvalid => "FAILED_EVPowerProfileInvalid",
            Self::FailedEvPowerProfileViolation => "FAILED_EVPowerProfileViolation",
            Self::FailedMeteringSignatureNotValid => "FAILED_MeteringSignatureNotValid",
            Self::FailedNoEnergyTransferServiceSelected => "FAILED_NoEnergyTransferServiceSelected",
            Self::FailedNoServiceRenegotiationSupported => "FAILED_NoServiceRenegotiationSupported",
            Self::FailedPauseNotAllowed => "FAILED_PauseNotAllowed",
            Self::FailedPowerDeliveryNotApplied => "FAILED_PowerDeliveryNotApplied",
            Self::FailedPowerToleranceNotConfirmed => "FAILED_PowerToleranceNotConfirmed",
            Self::FailedScheduleRenegotiation => "FAILED_ScheduleRenegotiation",
            Self::FailedScheduleSelectionInvalid => "FAILED_ScheduleSelectionInvalid",
            Self::FailedSequenceError => "FAILED_SequenceError",
            Self::FailedServiceIdInvalid => "FAILED_ServiceIDInvalid",
            Self::FailedServiceSelectionInvalid => "FAILED_ServiceSelectionInvalid",
            Self::FailedSignatureError => "FAILED_SignatureError",
            Self::FailedUnknownSession => "FAILED_UnknownSession",
            Self::FailedWrongChargeParameter => "FAILED_WrongChargeParameter",
        };
        f.write_str(s)
    }
}
