//! Timeout ordering and how the driver reacts to expiry

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{charge_loop_request, harness, power_delivery_request, session_config, SESSION_ID};
use pretty_assertions::assert_eq;
use v2g_core::{
    AcReqControlMode, ControlMode, Processing, Progress, Request, ScheduledAcReqControlMode,
    ServiceCategory,
};
use v2g_d20::states::{AcChargeLoop, PowerDelivery};
use v2g_d20::{
    AcChargeLoopData, Context, ControlEvent, Feedback, ManualClock, RecordingFeedback,
    SelectedServices, Session, Signal, StateId, StateMachine, TimeoutKind, Timeouts,
};

fn scheduled() -> AcReqControlMode {
    AcReqControlMode::Scheduled(ScheduledAcReqControlMode::default())
}

#[test]
fn expired_kinds_come_back_in_deadline_order() {
    let clock = Arc::new(ManualClock::new());
    let mut timeouts = Timeouts::new(clock.clone());

    timeouts.start(TimeoutKind::Sequence, 50);
    timeouts.start(TimeoutKind::Ongoing, 10);
    clock.advance(Duration::from_millis(60));

    assert_eq!(
        timeouts.check(),
        Some(vec![TimeoutKind::Ongoing, TimeoutKind::Sequence])
    );
}

#[test]
fn every_elapsed_kind_is_reported_and_no_other() {
    let clock = Arc::new(ManualClock::new());
    let mut timeouts = Timeouts::new(clock.clone());

    timeouts.start(TimeoutKind::Contactor, 40);
    timeouts.start(TimeoutKind::Performance, 20);
    timeouts.start(TimeoutKind::Sequence, 30);
    timeouts.start(TimeoutKind::Ongoing, 100);

    clock.advance(Duration::from_millis(35));
    assert_eq!(
        timeouts.check(),
        Some(vec![TimeoutKind::Performance, TimeoutKind::Sequence])
    );

    clock.advance(Duration::from_millis(10));
    assert_eq!(
        timeouts.check(),
        Some(vec![
            TimeoutKind::Performance,
            TimeoutKind::Sequence,
            TimeoutKind::Contactor
        ])
    );
}

#[test]
fn sequence_timeout_stops_session_after_silence() {
    let mut h = harness(ServiceCategory::Ac, ControlMode::Scheduled, AcChargeLoop::new());
    h.machine.handle_request(charge_loop_request(scheduled())).unwrap();

    h.clock.advance(Duration::from_millis(59_999));
    assert_eq!(h.machine.poll_timeouts(), None);
    assert!(!h.machine.is_stopped());

    h.clock.advance(Duration::from_millis(1));
    assert_eq!(h.machine.poll_timeouts(), Some(vec![TimeoutKind::Sequence]));
    assert!(h.machine.is_stopped());
    assert_eq!(h.feedback.signals(), vec![Signal::ChargeLoopStarted, Signal::DlinkError]);

    // Expired kinds are disarmed
    assert_eq!(h.machine.poll_timeouts(), None);
}

#[test]
fn each_request_rearms_sequence_timeout() {
    let mut h = harness(ServiceCategory::Ac, ControlMode::Scheduled, AcChargeLoop::new());

    for _ in 0..4 {
        h.machine.handle_request(charge_loop_request(scheduled())).unwrap();
        h.clock.advance(Duration::from_millis(40_000));
        assert_eq!(h.machine.poll_timeouts(), None);
    }
    assert!(!h.machine.is_stopped());
}

#[test]
fn unconfirmed_contactor_close_opens_contactor() {
    let mut h = harness(ServiceCategory::Ac, ControlMode::Scheduled, PowerDelivery::new());
    h.machine
        .handle_request(power_delivery_request(Progress::Start))
        .unwrap();
    assert_eq!(h.machine.state_id(), StateId::AcChargeLoop);

    let contactor_ms = h.machine.context().session_config.timeouts.contactor_ms;
    h.clock.advance(Duration::from_millis(contactor_ms));
    assert_eq!(h.machine.poll_timeouts(), Some(vec![TimeoutKind::Contactor]));
    assert_eq!(
        h.feedback.signals(),
        vec![
            Signal::AcCloseContactor,
            Signal::AcOpenContactor,
            Signal::DlinkError
        ]
    );
    assert!(h.machine.is_stopped());
}

#[test]
fn confirmed_contactor_close_disarms_timeout() {
    let mut h = harness(ServiceCategory::Ac, ControlMode::Scheduled, PowerDelivery::new());
    h.machine
        .handle_request(power_delivery_request(Progress::Start))
        .unwrap();

    h.clock.advance(Duration::from_millis(500));
    h.machine
        .handle_control(ControlEvent::ContactorStatus { closed: true });
    assert!(!h.machine.context().timeouts.is_active(TimeoutKind::Contactor));

    h.clock.advance(Duration::from_millis(10_000));
    assert_eq!(h.machine.poll_timeouts(), None);
    assert!(!h.machine.is_stopped());
}

#[test]
fn contactor_in_wrong_position_still_times_out() {
    let mut h = harness(ServiceCategory::Ac, ControlMode::Scheduled, PowerDelivery::new());
    h.machine
        .handle_request(power_delivery_request(Progress::Start))
        .unwrap();

    h.machine
        .handle_control(ControlEvent::ContactorStatus { closed: false });
    assert!(h.machine.context().timeouts.is_active(TimeoutKind::Contactor));

    h.clock.advance(Duration::from_millis(3_000));
    assert_eq!(h.machine.poll_timeouts(), Some(vec![TimeoutKind::Contactor]));
    assert!(h.machine.is_stopped());
}

#[test]
fn late_charge_loop_request_is_not_answered() {
    let mut h = harness(ServiceCategory::Ac, ControlMode::Scheduled, AcChargeLoop::new());
    h.machine.handle_request(charge_loop_request(scheduled())).unwrap();

    // No poll in between: the next request itself must notice the silence
    h.clock.advance(Duration::from_secs(90));
    assert_eq!(h.machine.handle_request(charge_loop_request(scheduled())), None);

    assert!(h.machine.is_stopped());
    assert_eq!(h.machine.state_id(), StateId::AcChargeLoop);
    assert_eq!(h.feedback.signals(), vec![Signal::ChargeLoopStarted, Signal::DlinkError]);
    assert_eq!(h.machine.poll_timeouts(), None);
}

#[test]
fn late_finished_power_delivery_cannot_escape_ongoing_limit() {
    let mut h = harness(ServiceCategory::Ac, ControlMode::Scheduled, PowerDelivery::new());

    let mut ongoing = match power_delivery_request(Progress::Start) {
        Request::PowerDelivery(req) => req,
        _ => unreachable!(),
    };
    ongoing.processing = Processing::Ongoing;
    h.machine
        .handle_request(Request::PowerDelivery(ongoing))
        .unwrap();

    let ongoing_ms = h.machine.context().session_config.timeouts.ongoing_ms;
    h.clock.advance(Duration::from_millis(ongoing_ms + 1_000));
    assert_eq!(
        h.machine.handle_request(power_delivery_request(Progress::Start)),
        None
    );

    assert!(h.machine.is_stopped());
    assert_eq!(h.machine.state_id(), StateId::PowerDelivery);
    assert_eq!(h.feedback.signals(), vec![Signal::DlinkError]);
}

/// Charger application that takes a while to react to contactor requests
struct SlowFeedback {
    clock: Arc<ManualClock>,
    delay: Duration,
    log: RecordingFeedback,
}

impl Feedback for SlowFeedback {
    fn signal(&mut self, signal: Signal) {
        if signal == Signal::AcCloseContactor {
            self.clock.advance(self.delay);
        }
        self.log.signal(signal);
    }

    fn ac_charge_loop_req(&mut self, data: AcChargeLoopData) {
        self.log.ac_charge_loop_req(data);
    }
}

#[test]
fn slow_request_handling_hits_performance_timeout() {
    let clock = Arc::new(ManualClock::new());
    let log = RecordingFeedback::new();
    let config = session_config();
    let feedback = SlowFeedback {
        clock: clock.clone(),
        delay: Duration::from_millis(config.timeouts.performance_ms + 500),
        log: log.clone(),
    };
    let ctx = Context::new(
        Session::with_id(
            SESSION_ID,
            SelectedServices::new(ServiceCategory::Ac, ControlMode::Scheduled),
        ),
        config,
        Box::new(feedback),
        clock.clone(),
    );
    let mut machine = StateMachine::new(ctx, PowerDelivery::new());

    assert_eq!(machine.handle_request(power_delivery_request(Progress::Start)), None);
    assert!(machine.is_stopped());
    assert_eq!(
        log.signals(),
        vec![Signal::AcCloseContactor, Signal::DlinkError]
    );
    assert!(!machine.context().timeouts.is_active(TimeoutKind::Performance));
}

#[test]
fn prompt_request_handling_disarms_performance_timeout() {
    let mut h = harness(ServiceCategory::Ac, ControlMode::Scheduled, AcChargeLoop::new());
    h.machine.handle_request(charge_loop_request(scheduled())).unwrap();

    let timeouts = &h.machine.context().timeouts;
    assert!(!timeouts.is_active(TimeoutKind::Performance));
    assert!(timeouts.is_active(TimeoutKind::Sequence));
}

#[test]
fn ongoing_power_delivery_is_bounded() {
    let mut h = harness(ServiceCategory::Ac, ControlMode::Scheduled, PowerDelivery::new());

    let mut req = match power_delivery_request(Progress::Start) {
        Request::PowerDelivery(req) => req,
        _ => unreachable!(),
    };
    req.processing = Processing::Ongoing;

    // EV keeps repeating "Ongoing", each time well within the sequence timeout
    for _ in 0..6 {
        h.machine
            .handle_request(Request::PowerDelivery(req.clone()))
            .unwrap();
        h.clock.advance(Duration::from_millis(10_000));
        if h.machine.is_stopped() {
            break;
        }
        h.machine.poll_timeouts();
    }

    assert!(h.machine.is_stopped());
    assert!(h.feedback.signals().contains(&Signal::DlinkError));
    assert!(!h.feedback.signals().contains(&Signal::AcCloseContactor));
}
