//! AC_ChargeLoop state
//!
//! Answers the repeated AC_ChargeLoopReq of an active AC energy transfer and
//! leaves for SessionStop when the EV sends PowerDeliveryReq(Stop).

use tracing::{info, warn};
use v2g_core::{
    AcChargeLoopRequest, AcChargeLoopResponse, AcReqControlMode, AcResControlMode,
    BptDynamicAcResControlMode, BptScheduledAcResControlMode, DynamicAcResControlMode,
    EvseNotification, EvseStatus, Progress, RationalNumber, Request, ResponseCode,
    ScheduledAcResControlMode,
};

use super::{power_delivery, send_sequence_error, setup_header, switch_contactor, SessionStop};
use crate::config::AcTransferLimits;
use crate::context::{ControlEvent, Context, SelectedServices, Session};
use crate::feedback::{AcChargeLoopData, Signal};
use crate::fsm::{Event, Transition};

// Target powers are left for the charger's power control loop to fill in.
fn scheduled_res(limits: &AcTransferLimits) -> ScheduledAcResControlMode {
    ScheduledAcResControlMode {
        target_active_power: None,
        target_reactive_power: None,
        present_active_power: limits.present_active_power,
    }
}

fn dynamic_res(limits: &AcTransferLimits) -> DynamicAcResControlMode {
    DynamicAcResControlMode {
        present_active_power: limits.present_active_power,
        ..Default::default()
    }
}

/// Response alternative mirroring the request's, or `None` when the request
/// disagrees with the negotiated control mode or energy service.
fn select_control_mode(
    req: &AcReqControlMode,
    selected: &SelectedServices,
    limits: &AcTransferLimits,
) -> Option<AcResControlMode> {
    let kind = req.kind();
    if kind.control_mode() != selected.selected_control_mode
        || kind.energy_service() != selected.selected_energy_service
    {
        return None;
    }

    let res = match req {
        AcReqControlMode::Scheduled(_) => AcResControlMode::Scheduled(scheduled_res(limits)),
        AcReqControlMode::BptScheduled(_) => {
            AcResControlMode::BptScheduled(BptScheduledAcResControlMode {
                base: scheduled_res(limits),
            })
        }
        AcReqControlMode::Dynamic(_) => AcResControlMode::Dynamic(dynamic_res(limits)),
        AcReqControlMode::BptDynamic(_) => {
            AcResControlMode::BptDynamic(BptDynamicAcResControlMode {
                base: dynamic_res(limits),
            })
        }
    };
    Some(res)
}

pub(crate) fn handle_request(
    req: &AcChargeLoopRequest,
    session: &Session,
    limits: &AcTransferLimits,
    stop: bool,
    target_frequency: f32,
) -> AcChargeLoopResponse {
    let mut res = AcChargeLoopResponse::default();

    if !setup_header(&mut res.header, session, &req.header.session_id) {
        res.response_code = ResponseCode::FailedUnknownSession;
        return res;
    }

    let Some(control_mode) =
        select_control_mode(&req.control_mode, &session.selected_services, limits)
    else {
        res.response_code = ResponseCode::Failed;
        return res;
    };

    res.control_mode = Some(control_mode);
    res.target_frequency = Some(RationalNumber::from_f32(target_frequency));

    if stop {
        res.status = Some(EvseStatus {
            notification_max_delay: 0,
            evse_notification: EvseNotification::Terminate,
        });
    }

    res.response_code = ResponseCode::Ok;
    res
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcChargeLoop {
    target_frequency: f32,
    stop: bool,
    first_entry: bool,
}

impl Default for AcChargeLoop {
    fn default() -> Self {
        Self {
            target_frequency: 0.0,
            stop: false,
            first_entry: true,
        }
    }
}

impl AcChargeLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frequency in Hz announced to the EV in every response
    pub fn with_target_frequency(mut self, hz: f32) -> Self {
        self.target_frequency = hz;
        self
    }

    pub fn target_frequency(&self) -> f32 {
        self.target_frequency
    }

    pub fn stop_requested(&self) -> bool {
        self.stop
    }

    /// True until the first AC_ChargeLoopReq of a known session was seen
    pub fn is_first_entry(&self) -> bool {
        self.first_entry
    }

    pub fn enter(&mut self, ctx: &mut Context) {
        info!(session = %ctx.session.id(), "Entering AC_ChargeLoop");
    }

    pub fn feed(&mut self, ctx: &mut Context, ev: Event) -> Transition {
        match ev {
            Event::ControlMessage => {
                // Other control events are not used in this state yet
                if let Some(ControlEvent::StopCharging(stop)) = ctx.control_event() {
                    self.stop = *stop;
                }
                Transition::Stay
            }
            Event::V2gtpMessage => self.handle_message(ctx),
        }
    }

    fn handle_message(&mut self, ctx: &mut Context) -> Transition {
        let Some(request) = ctx.pull_request() else {
            warn!("V2GTP event without a pending request");
            return Transition::Stay;
        };

        match request {
            Request::PowerDelivery(req) => {
                let res = power_delivery::handle_request(&req, &ctx.session);
                let failed = res.response_code.is_failure();
                ctx.respond(res);

                if failed {
                    ctx.session_stopped = true;
                    return Transition::Stay;
                }

                // EV may leave the loop directly, skipping the PowerDelivery state
                if req.charge_progress == Progress::Stop {
                    ctx.feedback.signal(Signal::ChargeLoopFinished);
                    switch_contactor(ctx, false);
                    return Transition::to(SessionStop::new());
                }

                Transition::Stay
            }
            Request::AcChargeLoop(req) => {
                if self.first_entry && ctx.session.is_session_id(&req.header.session_id) {
                    ctx.feedback.signal(Signal::ChargeLoopStarted);
                    self.first_entry = false;
                }

                let res = handle_request(
                    &req,
                    &ctx.session,
                    &ctx.session_config.ac_limits,
                    self.stop,
                    self.target_frequency,
                );
                let failed = res.response_code.is_failure();
                ctx.respond(res);

                if failed {
                    ctx.session_stopped = true;
                    return Transition::Stay;
                }

                let AcChargeLoopRequest {
                    display_parameters,
                    meter_info_requested,
                    control_mode,
                    ..
                } = req;

                ctx.feedback
                    .ac_charge_loop_req(AcChargeLoopData::ControlMode(control_mode));
                ctx.feedback
                    .ac_charge_loop_req(AcChargeLoopData::MeterInfoRequested(meter_info_requested));
                if let Some(display_parameters) = display_parameters {
                    ctx.feedback
                        .ac_charge_loop_req(AcChargeLoopData::DisplayParameters(display_parameters));
                }

                Transition::Stay
            }
            other => {
                let request_type = other.message_type();
                warn!(
                    message = %request_type,
                    "Expected PowerDeliveryReq or AC_ChargeLoopReq"
                );
                send_sequence_error(ctx, request_type);
                ctx.session_stopped = true;
                Transition::Stay
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackEvent;
    use crate::fsm::StateId;
    use crate::states::test_support;
    use pretty_assertions::assert_eq;
    use v2g_core::{
        ControlMode, DisplayParameters, DynamicAcReqControlMode, Header, PhasePower,
        PowerDeliveryRequest, Response, ScheduledAcReqControlMode, ServiceCategory, SessionId,
    };

    fn loop_request(ctx: &Context, control_mode: AcReqControlMode) -> Request {
        Request::AcChargeLoop(AcChargeLoopRequest {
            header: Header::new(ctx.session.id()),
            display_parameters: None,
            meter_info_requested: false,
            control_mode,
        })
    }

    fn scheduled() -> AcReqControlMode {
        AcReqControlMode::Scheduled(ScheduledAcReqControlMode::default())
    }

    fn take_loop_response(ctx: &mut Context) -> AcChargeLoopResponse {
        match ctx.take_response() {
            Some(Response::AcChargeLoop(res)) => res,
            other => panic!("Expected AC_ChargeLoopRes, got {:?}", other),
        }
    }

    #[test]
    fn test_scheduled_copies_present_power() {
        let (mut ctx, feedback) =
            test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        let mut state = AcChargeLoop::new();
        ctx.set_request(loop_request(&ctx, scheduled()));

        assert!(state.feed(&mut ctx, Event::V2gtpMessage).is_stay());

        let res = take_loop_response(&mut ctx);
        assert_eq!(res.response_code, ResponseCode::Ok);
        assert_eq!(res.target_frequency, Some(RationalNumber::ZERO));
        assert!(res.status.is_none());

        let expected = ctx.session_config.ac_limits.present_active_power;
        assert_eq!(
            res.control_mode,
            Some(AcResControlMode::Scheduled(ScheduledAcResControlMode {
                target_active_power: None,
                target_reactive_power: None,
                present_active_power: expected,
            }))
        );
        assert_eq!(feedback.signals(), vec![Signal::ChargeLoopStarted]);
        assert!(!ctx.session_stopped);
    }

    #[test]
    fn test_started_signal_fires_once() {
        let (mut ctx, feedback) =
            test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        let mut state = AcChargeLoop::new();

        for _ in 0..3 {
            ctx.set_request(loop_request(&ctx, scheduled()));
            let _ = state.feed(&mut ctx, Event::V2gtpMessage);
        }

        assert_eq!(feedback.signals(), vec![Signal::ChargeLoopStarted]);
        assert!(!state.is_first_entry());
    }

    #[test]
    fn test_mismatch_fails_without_alternative() {
        let (mut ctx, feedback) =
            test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        let mut state = AcChargeLoop::new();
        ctx.set_request(loop_request(
            &ctx,
            AcReqControlMode::Dynamic(DynamicAcReqControlMode::default()),
        ));

        assert!(state.feed(&mut ctx, Event::V2gtpMessage).is_stay());

        let res = take_loop_response(&mut ctx);
        assert_eq!(res.response_code, ResponseCode::Failed);
        assert!(res.control_mode.is_none());
        assert!(res.target_frequency.is_none());
        assert!(ctx.session_stopped);
        // EV parameters are only forwarded on success
        assert_eq!(feedback.signals(), vec![Signal::ChargeLoopStarted]);
        assert_eq!(feedback.events().len(), 1);
    }

    #[test]
    fn test_dynamic_target_defaults_to_zero() {
        let (mut ctx, _) = test_support::context(ServiceCategory::Ac, ControlMode::Dynamic);
        let mut state = AcChargeLoop::new().with_target_frequency(50.0);
        ctx.set_request(loop_request(
            &ctx,
            AcReqControlMode::Dynamic(DynamicAcReqControlMode::default()),
        ));

        let _ = state.feed(&mut ctx, Event::V2gtpMessage);

        let res = take_loop_response(&mut ctx);
        assert_eq!(res.target_frequency, Some(RationalNumber::new(50, 0)));
        match res.control_mode {
            Some(AcResControlMode::Dynamic(mode)) => {
                assert_eq!(mode.target_active_power, PhasePower::default());
                assert!(mode.target_reactive_power.is_none());
                assert!(mode.present_active_power.is_some());
            }
            other => panic!("Expected Dynamic, got {:?}", other),
        }
    }

    #[test]
    fn test_stop_control_adds_terminate_status() {
        let (mut ctx, _) = test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        let mut state = AcChargeLoop::new();

        ctx.set_control_event(ControlEvent::StopCharging(true));
        assert!(state.feed(&mut ctx, Event::ControlMessage).is_stay());
        assert!(state.stop_requested());

        ctx.set_request(loop_request(&ctx, scheduled()));
        let _ = state.feed(&mut ctx, Event::V2gtpMessage);

        let res = take_loop_response(&mut ctx);
        assert_eq!(
            res.status,
            Some(EvseStatus {
                notification_max_delay: 0,
                evse_notification: EvseNotification::Terminate,
            })
        );
        assert_eq!(res.response_code, ResponseCode::Ok);
    }

    #[test]
    fn test_stop_control_can_be_withdrawn() {
        let (mut ctx, _) = test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        let mut state = AcChargeLoop::new();

        ctx.set_control_event(ControlEvent::StopCharging(true));
        let _ = state.feed(&mut ctx, Event::ControlMessage);
        ctx.set_control_event(ControlEvent::StopCharging(false));
        let _ = state.feed(&mut ctx, Event::ControlMessage);

        assert!(!state.stop_requested());
    }

    #[test]
    fn test_forwards_ev_parameters() {
        let (mut ctx, feedback) =
            test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        let mut state = AcChargeLoop::new();
        let display = DisplayParameters {
            present_soc: Some(42),
            ..Default::default()
        };
        ctx.set_request(Request::AcChargeLoop(AcChargeLoopRequest {
            header: Header::new(ctx.session.id()),
            display_parameters: Some(display.clone()),
            meter_info_requested: true,
            control_mode: scheduled(),
        }));

        let _ = state.feed(&mut ctx, Event::V2gtpMessage);

        assert_eq!(
            feedback.events(),
            vec![
                FeedbackEvent::Signal(Signal::ChargeLoopStarted),
                FeedbackEvent::AcChargeLoop(AcChargeLoopData::ControlMode(scheduled())),
                FeedbackEvent::AcChargeLoop(AcChargeLoopData::MeterInfoRequested(true)),
                FeedbackEvent::AcChargeLoop(AcChargeLoopData::DisplayParameters(display)),
            ]
        );
    }

    #[test]
    fn test_unknown_session_skips_started_signal() {
        let (mut ctx, feedback) =
            test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        let mut state = AcChargeLoop::new();
        ctx.set_request(Request::AcChargeLoop(AcChargeLoopRequest {
            header: Header::new(SessionId([7; 8])),
            display_parameters: None,
            meter_info_requested: false,
            control_mode: scheduled(),
        }));

        let _ = state.feed(&mut ctx, Event::V2gtpMessage);

        let res = take_loop_response(&mut ctx);
        assert_eq!(res.response_code, ResponseCode::FailedUnknownSession);
        assert!(ctx.session_stopped);
        assert!(feedback.events().is_empty());
        assert!(state.is_first_entry());
    }

    #[test]
    fn test_power_delivery_stop_goes_to_session_stop() {
        let (mut ctx, feedback) =
            test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        let mut state = AcChargeLoop::new();
        ctx.set_request(Request::PowerDelivery(PowerDeliveryRequest::new(
            Header::new(ctx.session.id()),
            Progress::Stop,
        )));

        let transition = state.feed(&mut ctx, Event::V2gtpMessage);
        assert_eq!(transition.target(), Some(StateId::SessionStop));
        assert_eq!(
            feedback.signals(),
            vec![Signal::ChargeLoopFinished, Signal::AcOpenContactor]
        );
        assert!(ctx.timeouts.is_active(crate::timeout::TimeoutKind::Contactor));
    }

    #[test]
    fn test_power_delivery_standby_stays() {
        let (mut ctx, feedback) =
            test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        let mut state = AcChargeLoop::new();
        ctx.set_request(Request::PowerDelivery(PowerDeliveryRequest::new(
            Header::new(ctx.session.id()),
            Progress::Standby,
        )));

        assert!(state.feed(&mut ctx, Event::V2gtpMessage).is_stay());
        assert!(feedback.signals().is_empty());
        assert_eq!(ctx.take_response().unwrap().response_code(), ResponseCode::Ok);
    }

    #[test]
    fn test_unexpected_message_is_sequence_error() {
        let (mut ctx, _) = test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        let mut state = AcChargeLoop::new();
        ctx.set_request(Request::SessionSetup(Default::default()));

        assert!(state.feed(&mut ctx, Event::V2gtpMessage).is_stay());
        assert!(ctx.session_stopped);
        assert_eq!(
            ctx.take_response().unwrap().response_code(),
            ResponseCode::FailedSequenceError
        );
    }

    #[test]
    fn test_missing_request_is_tolerated() {
        let (mut ctx, _) = test_support::context(ServiceCategory::Ac, ControlMode::Scheduled);
        let mut state = AcChargeLoop::new();
        assert!(state.feed(&mut ctx, Event::V2gtpMessage).is_stay());
        assert!(ctx.take_response().is_none());
        assert!(!ctx.session_stopped);
    }
}
