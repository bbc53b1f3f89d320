use tracing::{info, warn};
use v2g_core::{
    PowerDeliveryRequest, PowerDeliveryResponse, Processing, Progress, Request, ResponseCode,
};

use super::{send_sequence_error, setup_header, switch_contactor, AcChargeLoop, SessionStop};
use crate::context::{Context, Session};
use crate::fsm::{Event, Transition};
use crate::timeout::TimeoutKind;

/// Validate a PowerDeliveryReq against the session and build the response
pub(crate) fn handle_request(
    req: &PowerDeliveryRequest,
    session: &Session,
) -> PowerDeliveryResponse {
    let mut res = PowerDeliveryResponse::default();

    res.response_code = if setup_header(&mut res.header, session, &req.header.session_id) {
        ResponseCode::Ok
    } else {
        ResponseCode::FailedUnknownSession
    };

    res
}

/// Waiting for the EV to start (or give up on) energy transfer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerDelivery;

impl PowerDelivery {
    pub fn new() -> Self {
        Self
    }

    pub fn enter(&mut self, ctx: &mut Context) {
        info!(session = %ctx.session.id(), "Entering PowerDelivery");
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
            Request::PowerDelivery(req) => req,
            other => {
                let request_type = other.message_type();
                warn!(message = %request_type, "Expected PowerDeliveryReq");
                send_sequence_error(ctx, request_type);
                ctx.session_stopped = true;
                return Transition::Stay;
            }
        };

        let res = handle_request(&req, &ctx.session);
        let failed = res.response_code.is_failure();
        ctx.respond(res);

        if failed {
            ctx.session_stopped = true;
            return Transition::Stay;
        }

        // Ongoing bounds the whole run of repeated requests, so only the first one arms it
        if req.processing != Processing::Finished {
            if !ctx.timeouts.is_active(TimeoutKind::Ongoing) {
                let ongoing_ms = ctx.session_config.timeouts.duration_ms(TimeoutKind::Ongoing);
                ctx.timeouts.start(TimeoutKind::Ongoing, ongoing_ms);
            }
            return Transition::Stay;
        }
        ctx.timeouts.reset(TimeoutKind::Ongoing);

        match req.charge_progress {
            Progress::Start => {
                switch_contactor(ctx, true);
                Transition::to(AcChargeLoop::new())
            }
            Progress::Stop => {
                switch_contactor(ctx, false);
                Transition::to(SessionStop::new())
            }
            Progress::Standby | Progress::ScheduleRenegotiation => Transition::Stay,
        }
    }
}
