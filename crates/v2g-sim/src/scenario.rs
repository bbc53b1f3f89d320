//! Scenario files and their execution
//!
//! A scenario is a JSON document describing the negotiated session and a list
//! of steps. Requests without a `header` get one for the scenario's session.
//!
//! ```json
//! {
//!   "name": "scheduled AC",
//!   "session": { "selected_energy_service": "Ac", "selected_control_mode": "Scheduled" },
//!   "initial_state": "PowerDelivery",
//!   "steps": [
//!     { "request": { "type": "PowerDelivery", "charge_progress": "Start" } },
//!     { "control": { "ContactorStatus": { "closed": true } } },
//!     { "wait_ms": 1000 },
//!     { "control": { "StopCharging": true } }
//!   ]
//! }
//! ```

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use v2g_core::app_protocol::ISO_15118_20_AC_NAMESPACE;
use v2g_core::{negotiate, AppProtocol, Header, Request, SessionId, SupportedAppProtocolRequest};
use v2g_d20::states::{AcChargeLoop, PowerDelivery};
use v2g_d20::{
    ChannelFeedback, Context, ControlEvent, FeedbackEvent, ManualClock, SelectedServices,
    Session, SessionConfig, State, StateMachine,
};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub enum InitialState {
    #[default]
    PowerDelivery,
    AcChargeLoop,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// SupportedAppProtocol handshake, answered before the -20 session starts
    AppProtocol(SupportedAppProtocolRequest),
    Request(Value),
    Control(ControlEvent),
    /// Advance virtual time, then poll the timeouts
    WaitMs(u64),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    /// Hex encoded, random when absent
    #[serde(default)]
    pub session_id: Option<String>,
    pub session: SelectedServices,
    #[serde(default)]
    pub initial_state: InitialState,
    /// Frequency announced in AC_ChargeLoopRes when starting in AcChargeLoop;
    /// defaults to the configured nominal frequency
    #[serde(default)]
    pub target_frequency: Option<f32>,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read scenario '{}'", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse scenario '{}'", path.display()))
    }

    fn session_id(&self) -> Result<Option<SessionId>> {
        let Some(hex_id) = &self.session_id else {
            return Ok(None);
        };
        let bytes = hex::decode(hex_id).context("session_id is not valid hex")?;
        let id: [u8; SessionId::LEN] = match bytes.try_into() {
            Ok(id) => id,
            Err(bytes) => bail!("session_id must be 8 bytes, got {}", bytes.len()),
        };
        Ok(Some(SessionId(id)))
    }
}

/// Outcome of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub responses: usize,
    pub stopped: bool,
    pub virtual_time: Duration,
}

pub struct Runner {
    machine: StateMachine,
    clock: Arc<ManualClock>,
    feedback_rx: mpsc::UnboundedReceiver<FeedbackEvent>,
    supported_protocols: Vec<AppProtocol>,
}

impl Runner {
    pub fn new(scenario: &Scenario, session_config: SessionConfig) -> Result<Self> {
        let session = match scenario.session_id()? {
            Some(id) => Session::with_id(id, scenario.session),
            None => Session::new(scenario.session),
        };

        let mut supported_protocols = vec![AppProtocol::new(ISO_15118_20_AC_NAMESPACE, 1, 0)];
        if let Some(custom) = &session_config.custom_protocol {
            supported_protocols.push(AppProtocol::new(custom.clone(), 1, 0));
        }

        let target_frequency = scenario
            .target_frequency
            .unwrap_or(session_config.ac_limits.nominal_frequency);

        let clock = Arc::new(ManualClock::new());
        let (feedback, feedback_rx) = ChannelFeedback::new();
        let ctx = Context::new(session, session_config, Box::new(feedback), clock.clone());

        let initial = match scenario.initial_state {
            InitialState::PowerDelivery => State::from(PowerDelivery::new()),
            InitialState::AcChargeLoop => {
                State::from(AcChargeLoop::new().with_target_frequency(target_frequency))
            }
        };

        info!(
            session = %ctx.session.id(),
            energy_service = %scenario.session.selected_energy_service,
            control_mode = ?scenario.session.selected_control_mode,
            "Starting scenario {}",
            scenario.name.as_deref().unwrap_or("<unnamed>")
        );

        Ok(Self {
            machine: StateMachine::new(ctx, initial),
            clock,
            feedback_rx,
            supported_protocols,
        })
    }

    /// Execute every step, writing one JSON line per observable output
    pub fn run(&mut self, steps: &[Step], out: &mut impl Write) -> Result<Summary> {
        let mut responses = 0;

        for (index, step) in steps.iter().enumerate() {
            if self.machine.is_stopped() {
                warn!(step = index, "Session stopped, skipping remaining steps");
                break;
            }

            match step {
                Step::AppProtocol(req) => {
                    let res = negotiate(req, &self.supported_protocols);
                    writeln!(out, "{}", json!({ "step": index, "app_protocol": res }))?;
                }
                Step::Request(raw) => {
                    let request = self.decode_request(raw.clone())?;
                    if let Some(res) = self.machine.handle_request(request) {
                        responses += 1;
                        writeln!(out, "{}", json!({ "step": index, "response": res }))?;
                    }
                }
                Step::Control(event) => self.machine.handle_control(event.clone()),
                Step::WaitMs(ms) => {
                    self.clock.advance(Duration::from_millis(*ms));
                    debug!(elapsed_ms = self.clock.elapsed().as_millis() as u64, "Time advanced");
                }
            }

            if let Some(expired) = self.machine.poll_timeouts() {
                let kinds: Vec<String> = expired.iter().map(|k| k.to_string()).collect();
                writeln!(out, "{}", json!({ "step": index, "timeouts": kinds }))?;
            }

            self.drain_feedback(index, out)?;
        }

        info!(
            state = %self.machine.state_id(),
            stopped = self.machine.is_stopped(),
            "Scenario finished"
        );

        Ok(Summary {
            responses,
            stopped: self.machine.is_stopped(),
            virtual_time: self.clock.elapsed(),
        })
    }

    fn decode_request(&self, mut raw: Value) -> Result<Request> {
        if let Some(obj) = raw.as_object_mut() {
            if !obj.contains_key("header") {
                let header = Header::new(self.machine.context().session.id());
                obj.insert("header".into(), serde_json::to_value(header)?);
            }
        }
        serde_json::from_value(raw).context("Invalid request in scenario")
    }

    fn drain_feedback(&mut self, index: usize, out: &mut impl Write) -> Result<()> {
        while let Ok(event) = self.feedback_rx.try_recv() {
            debug!(?event, "Feedback");
            writeln!(out, "{}", json!({ "step": index, "feedback": event }))?;
        }
        Ok(())
    }
}
