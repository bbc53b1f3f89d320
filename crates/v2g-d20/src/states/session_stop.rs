use tracing::{info, warn};
use v2g_core::{ChargingSession, Request, ResponseCode, SessionStopResponse};

use super::{send_sequence_error, setup_header};
use crate::context::Context;
use crate::feedback::Signal;
use crate::fsm::{Event, Transition};

/// Final state: waits for SessionStopReq and ends the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStop;

impl SessionStop {
    pub fn new() -> Self {
        Self
    }

    pub fn enter(&mut self, ctx: &mut Context) {
        info!(session = %ctx.session.id(), "Entering SessionStop");
    }

    pub fn feed(&mut self, ctx: &mut Context, ev: Event) -> Transition {
        if ev != Event::V2gtpMessage {
            return Transition::Stay;
        }

        let Some(request) = ctx.pull_request() else {
            warn!("V2GTP event without a pending request");
            return Transition::Stay;
        };

        let req = match request {
            Request::SessionStop(req) => req,
            other => {
                let request_type = other.message_type();
                warn!(message = %request_type, "Expected SessionStopReq");
                send_sequence_error(ctx, request_type);
                ctx.session_stopped = true;
                return Transition::Stay;
            }
        };

        let mut res = SessionStopResponse::default();
        if !setup_header(&mut res.header, &ctx.session, &req.header.session_id) {
            res.response_code = ResponseCode::FailedUnknownSession;
            ctx.respond(res);
            ctx.session_stopped = true;
            return Transition::Stay;
        }

        let signal = match req.charging_session {
            ChargingSession::Terminate => Some(Signal::DlinkTerminate),
            ChargingSession::Pause => Some(Signal::DlinkPause),
            ChargingSession::ServiceRenegotiation => None,
        };

        res.response_code = match signal {
            Some(_) => ResponseCode::Ok,
            None => ResponseCode::FailedNoServiceRenegotiationSupported,
        };

        info!(
            charging_session = ?req.charging_session,
            termination_code = req.ev_termination_code.as_deref().unwrap_or("-"),
            "EV requested session stop"
        );

        ctx.respond(res);
        if let Some(signal) = signal {
            ctx.feedback.signal(signal);
        }
        ctx.session_stopped = true;
        Transition::Stay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::test_support;
    use v2g_core::{ControlMode, Header, ServiceCategory, SessionId, SessionStopRequest};

    fn request(session_id: SessionId, charging_session: ChargingSession) -> Request {
        Request::SessionStop(SessionStopRequest {
            header: Header::new(session_id),
            charging_session,
            ev_termination_code: None,
            ev_termination_explanation: None,
        })
    }

    #[test]
    fn test_terminate() {
        let (mut ctx, feedback) =
            test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        ctx.set_request(request(ctx.session.id(), ChargingSession::Terminate));

        assert!(SessionStop::new().feed(&mut ctx, Event::V2gtpMessage).is_stay());
        assert_eq!(feedback.signals(), vec![Signal::DlinkTerminate]);
        assert_eq!(ctx.take_response().unwrap().response_code(), ResponseCode::Ok);
        assert!(ctx.session_stopped);
    }

    #[test]
    fn test_pause() {
        let (mut ctx, feedback) =
            test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        ctx.set_request(request(ctx.session.id(), ChargingSession::Pause));

        let _ = SessionStop::new().feed(&mut ctx, Event::V2gtpMessage);
        assert_eq!(feedback.signals(), vec![Signal::DlinkPause]);
        assert!(ctx.session_stopped);
    }

    #[test]
    fn test_service_renegotiation_not_supported() {
        let (mut ctx, feedback) =
            test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        ctx.set_request(request(ctx.session.id(), ChargingSession::ServiceRenegotiation));

        let _ = SessionStop::new().feed(&mut ctx, Event::V2gtpMessage);
        assert!(feedback.signals().is_empty());
        assert_eq!(
            ctx.take_response().unwrap().response_code(),
            ResponseCode::FailedNoServiceRenegotiationSupported
        );
        assert!(ctx.session_stopped);
    }

    #[test]
    fn test_unknown_session() {
        let (mut ctx, feedback) =
            test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        ctx.set_request(request(SessionId([1; 8]), ChargingSession::Terminate));

        let _ = SessionStop::new().feed(&mut ctx, Event::V2gtpMessage);
        assert!(feedback.signals().is_empty());
        assert_eq!(
            ctx.take_response().unwrap().response_code(),
            ResponseCode::FailedUnknownSession
        );
    }

    #[test]
    fn test_charge_loop_request_is_sequence_error() {
        let (mut ctx, _) = test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        ctx.set_request(Request::PowerDelivery(v2g_core::PowerDeliveryRequest::new(
            Header::new(ctx.session.id()),
            v2g_core::Progress::Stop,
        )));

        let _ = SessionStop::new().feed(&mut ctx, Event::V2gtpMessage);
        assert_eq!(
            ctx.take_response().unwrap().response_code(),
            ResponseCode::FailedSequenceError
        );
        assert!(ctx.session_stopped);
    }
}
