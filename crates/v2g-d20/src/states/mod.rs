//! Concrete protocol states
//!
//! Only the states reachable from PowerDelivery onwards exist here; the
//! session is handed over after service selection and charge parameter
//! discovery have already happened.

mod ac_charge_loop;
mod power_delivery;
mod session_stop;

pub use ac_charge_loop::AcChargeLoop;
pub use power_delivery::PowerDelivery;
pub use session_stop::SessionStop;

use v2g_core::{Header, MessageType, Response, SessionId};

use crate::context::{Context, Session};
use crate::feedback::Signal;
use crate::timeout::TimeoutKind;

/// Stamp `header` for a response in `session`.
///
/// Returns false when the request named a different session.
pub(crate) fn setup_header(
    header: &mut Header,
    session: &Session,
    request_id: &SessionId,
) -> bool {
    *header = Header::new(session.id());
    session.is_session_id(request_id)
}

pub(crate) fn send_sequence_error(ctx: &mut Context, request_type: MessageType) {
    let header = Header::new(ctx.session.id());
    ctx.respond(Response::sequence_error(request_type, header));
}

/// Ask the charger to close or open the AC contactor and arm CONTACTOR until
/// it reports the new position.
pub(crate) fn switch_contactor(ctx: &mut Context, close: bool) {
    let signal = if close {
        Signal::AcCloseContactor
    } else {
        Signal::AcOpenContactor
    };
    ctx.feedback.signal(signal);

    // A new request replaces an unconfirmed one
    ctx.contactor_pending = Some(close);
    ctx.timeouts.reset(TimeoutKind::Contactor);
    let contactor_ms = ctx.session_config.timeouts.duration_ms(TimeoutKind::Contactor);
    ctx.timeouts.start(TimeoutKind::Contactor, contactor_ms);
}
