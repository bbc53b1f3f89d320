//! Shared setup for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use v2g_core::{
    AcChargeLoopRequest, AcReqControlMode, ControlMode, Header, PowerDeliveryRequest, Progress,
    Request, ServiceCategory, SessionId,
};
use v2g_d20::{
    Context, EvseSetupConfig, ManualClock, RecordingFeedback, SelectedServices, Session,
    SessionConfig, State, StateMachine,
};

pub const SESSION_ID: SessionId = SessionId([0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x80]);

pub const EVSE_TOML: &str = r#"
evse_id = "DE*PNX*E12345*1"
supported_energy_services = ["Ac", "AcBpt"]

[ac_limits]
max_charge_power = { l1 = { value = 11, exponent = 3 } }
min_charge_power = { l1 = { value = 1, exponent = 3 } }
max_discharge_power = { l1 = { value = 7, exponent = 3 } }
min_discharge_power = { l1 = { value = 1, exponent = 3 } }
present_active_power = { l1 = { value = 3680, exponent = 0 }, l2 = { value = 3680, exponent = 0 }, l3 = { value = 3680, exponent = 0 } }

[timeouts]
sequence_ms = 60000
ongoing_ms = 55000
contactor_ms = 3000
"#;

pub struct Harness {
    pub machine: StateMachine,
    pub feedback: RecordingFeedback,
    pub clock: Arc<ManualClock>,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn session_config() -> SessionConfig {
    SessionConfig::new(EvseSetupConfig::from_toml_str(EVSE_TOML).unwrap())
}

pub fn harness(
    energy_service: ServiceCategory,
    control_mode: ControlMode,
    initial: impl Into<State>,
) -> Harness {
    init_tracing();

    let clock = Arc::new(ManualClock::new());
    let feedback = RecordingFeedback::new();
    let ctx = Context::new(
        Session::with_id(
            SESSION_ID,
            SelectedServices::new(energy_service, control_mode),
        ),
        session_config(),
        Box::new(feedback.clone()),
        clock.clone(),
    );

    Harness {
        machine: StateMachine::new(ctx, initial),
        feedback,
        clock,
    }
}

pub fn charge_loop_request(control_mode: AcReqControlMode) -> Request {
    Request::AcChargeLoop(AcChargeLoopRequest {
        header: Header::new(SESSION_ID),
        display_parameters: None,
        meter_info_requested: false,
        control_mode,
    })
}

pub fn power_delivery_request(progress: Progress) -> Request {
    Request::PowerDelivery(PowerDeliveryRequest::new(Header::new(SESSION_ID), progress))
}
