//! v2g-core - ISO 15118-20 message data model
//!
//! This crate holds the decoded form of the messages an EVSE exchanges with a
//! vehicle during a -20 session. Encoding and decoding (EXI) live elsewhere;
//! everything here is plain data that the state machine in `v2g-d20` reads
//! and builds.
//!
//! # Layout
//!
//! ```text
//! datatypes      shared enums, RationalNumber, PhasePower, Header
//! response_code  ordered ResponseCode set (OK < WARNING < FAILED)
//! messages       per-message request/response structs, Request/Response sums
//! app_protocol   SupportedAppProtocol handshake and negotiation
//! ```

pub mod app_protocol;
pub mod datatypes;
pub mod messages;
pub mod response_code;

pub use app_protocol::{
    negotiate, AppProtocol, AppProtocolResponseCode, SupportedAppProtocolRequest,
    SupportedAppProtocolResponse,
};
pub use datatypes::*;
pub use messages::*;
pub use response_code::ResponseCode;
