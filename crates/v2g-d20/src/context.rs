//! Per-session context shared by all states
//!
//! ```text
//!   transport ──► MessageExchange.request ──► State::feed ──► MessageExchange.response ──► transport
//!                                                 │
//!   charger app ──► ControlEvent ─────────────────┤
//!                                                 └──► Feedback (signals, EV parameters)
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use v2g_core::{ControlMode, MobilityNeedsMode, Request, Response, ServiceCategory, SessionId};

use crate::config::SessionConfig;
use crate::feedback::Feedback;
use crate::timeout::{Clock, Timeouts};

// =============================================================================
// Session
// =============================================================================

/// Outcome of service discovery and selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedServices {
    pub selected_energy_service: ServiceCategory,
    pub selected_control_mode: ControlMode,
    #[serde(default = "default_mobility_needs_mode")]
    pub selected_mobility_needs_mode: MobilityNeedsMode,
}

fn default_mobility_needs_mode() -> MobilityNeedsMode {
    MobilityNeedsMode::ProvidedByEvcc
}

impl SelectedServices {
    pub fn new(energy_service: ServiceCategory, control_mode: ControlMode) -> Self {
        Self {
            selected_energy_service: energy_service,
            selected_control_mode: control_mode,
            selected_mobility_needs_mode: default_mobility_needs_mode(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    pub selected_services: SelectedServices,
}

impl Session {
    /// New session with a random id
    pub fn new(selected_services: SelectedServices) -> Self {
        let bytes = uuid::Uuid::new_v4().into_bytes();
        let mut id = [0u8; SessionId::LEN];
        id.copy_from_slice(&bytes[..SessionId::LEN]);
        Self::with_id(SessionId(id), selected_services)
    }

    pub fn with_id(id: SessionId, selected_services: SelectedServices) -> Self {
        Self {
            id,
            selected_services,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_session_id(&self, other: &SessionId) -> bool {
        self.id == *other
    }
}

// =============================================================================
// Control events
// =============================================================================

/// Parameters the charger application may push for dynamic mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicModeParameters {
    #[serde(default)]
    pub departure_time: Option<u32>,
    #[serde(default)]
    pub min_soc: Option<i8>,
    #[serde(default)]
    pub target_soc: Option<i8>,
}

/// Local instruction from the charger application, not a wire message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlEvent {
    /// `true` asks the EV to stop at the next charge-loop response, `false` withdraws it
    StopCharging(bool),
    PresentVoltageCurrent { voltage: f32, current: f32 },
    UpdateDynamicModeParameters(DynamicModeParameters),
    /// Contactor position reported by the charger hardware
    ContactorStatus { closed: bool },
}

// =============================================================================
// Context
// =============================================================================

/// Inbound request and outbound response slots
#[derive(Debug, Default)]
pub struct MessageExchange {
    request: Option<Request>,
    response: Option<Response>,
}

impl MessageExchange {
    pub fn set_request(&mut self, request: Request) {
        self.request = Some(request);
    }

    pub fn pull_request(&mut self) -> Option<Request> {
        self.request.take()
    }

    pub fn set_response(&mut self, response: Response) {
        self.response = Some(response);
    }

    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }
}

pub struct Context {
    pub session: Session,
    pub session_config: SessionConfig,
    /// Set once the session must be torn down; never cleared
    pub session_stopped: bool,
    pub timeouts: Timeouts,
    pub feedback: Box<dyn Feedback>,
    /// Position the contactor was last asked to switch to, until confirmed
    pub(crate) contactor_pending: Option<bool>,
    exchange: MessageExchange,
    control_event: Option<ControlEvent>,
}

impl Context {
    pub fn new(
        session: Session,
        session_config: SessionConfig,
        feedback: Box<dyn Feedback>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session,
            session_config,
            session_stopped: false,
            timeouts: Timeouts::new(clock),
            feedback,
            contactor_pending: None,
            exchange: MessageExchange::default(),
            control_event: None,
        }
    }

    /// Take the pending inbound request, if any
    pub fn pull_request(&mut self) -> Option<Request> {
        self.exchange.pull_request()
    }

    pub fn respond(&mut self, response: impl Into<Response>) {
        self.exchange.set_response(response.into());
    }

    pub fn control_event(&self) -> Option<&ControlEvent> {
        self.control_event.as_ref()
    }

    pub(crate) fn set_request(&mut self, request: Request) {
        self.exchange.set_request(request);
    }

    pub(crate) fn take_response(&mut self) -> Option<Response> {
        self.exchange.take_response()
    }

    pub(crate) fn set_control_event(&mut self, event: ControlEvent) {
        self.control_event = Some(event);
    }

    pub(crate) fn clear_control_event(&mut self) {
        self.control_event = None;
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("session", &self.session)
            .field("session_stopped", &self.session_stopped)
            .field("timeouts", &self.timeouts)
            .field("contactor_pending", &self.contactor_pending)
            .field("exchange", &self.exchange)
            .field("control_event", &self.control_event)
            .finish_non_exhaustive()
    }
}
