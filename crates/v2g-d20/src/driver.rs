//! Session driver
//!
//! Owns the [`Context`] and the current [`State`], turns inbound requests and
//! control events into [`Event`]s and applies the timeout policy.

use tracing::{debug, error, info, warn};
use v2g_core::{Request, Response};

use crate::context::{ControlEvent, Context};
use crate::feedback::Signal;
use crate::fsm::{Event, State, StateId, Transition};
use crate::timeout::TimeoutKind;

#[derive(Debug)]
pub struct StateMachine {
    ctx: Context,
    state: State,
}

impl StateMachine {
    /// Install `initial` as the current state and enter it
    pub fn new(mut ctx: Context, initial: impl Into<State>) -> Self {
        let mut state = initial.into();
        state.enter(&mut ctx);
        Self { ctx, state }
    }

    /// Feed one decoded request and return the response to send, if any.
    ///
    /// Requests arriving after the session stopped are dropped, as are
    /// requests that find a timeout already expired. A response is withheld
    /// when a timeout expires while the request is being handled.
    pub fn handle_request(&mut self, request: Request) -> Option<Response> {
        if self.ctx.session_stopped {
            warn!(message = %request.message_type(), "Session stopped, dropping request");
            return None;
        }

        if self.poll_timeouts().is_some() {
            warn!(
                message = %request.message_type(),
                "Timeout expired before request, dropping it"
            );
            return None;
        }

        self.ctx.timeouts.reset(TimeoutKind::Sequence);
        self.start_timeout(TimeoutKind::Performance);

        debug!(
            message = %request.message_type(),
            state = %self.state.id(),
            "Handling request"
        );
        self.ctx.set_request(request);
        self.feed(Event::V2gtpMessage);

        let response = self.ctx.take_response();

        if self.poll_timeouts().is_some() {
            warn!(
                state = %self.state.id(),
                "Timeout expired while handling request, no response sent"
            );
            self.ctx.timeouts.reset(TimeoutKind::Performance);
            return None;
        }
        self.ctx.timeouts.stop(TimeoutKind::Performance);

        if let Some(res) = &response {
            debug!(
                message = %res.message_type(),
                response_code = %res.response_code(),
                "Sending response"
            );
        }

        if !self.ctx.session_stopped {
            self.start_timeout(TimeoutKind::Sequence);
        }

        response
    }

    pub fn handle_control(&mut self, event: ControlEvent) {
        debug!(?event, state = %self.state.id(), "Handling control event");
        if let ControlEvent::ContactorStatus { closed } = &event {
            self.confirm_contactor(*closed);
        }

        self.ctx.set_control_event(event);
        self.feed(Event::ControlMessage);
        self.ctx.clear_control_event();
    }

    fn confirm_contactor(&mut self, closed: bool) {
        match self.ctx.contactor_pending {
            Some(expected) if expected == closed => {
                info!(closed, "Contactor switched");
                self.ctx.contactor_pending = None;
                self.ctx.timeouts.stop(TimeoutKind::Contactor);
            }
            Some(expected) => {
                warn!(closed, expected, "Contactor reported the wrong position");
            }
            None => {
                debug!(closed, "Contactor status without a pending switch");
            }
        }
    }

    fn start_timeout(&mut self, kind: TimeoutKind) {
        let duration_ms = self.ctx.session_config.timeouts.duration_ms(kind);
        self.ctx.timeouts.start(kind, duration_ms);
    }

    /// Check all timeouts and stop the session if any expired.
    ///
    /// Returns the expired kinds, earliest first.
    pub fn poll_timeouts(&mut self) -> Option<Vec<TimeoutKind>> {
        let expired = self.ctx.timeouts.check()?;

        for &kind in &expired {
            match kind {
                TimeoutKind::Sequence | TimeoutKind::Performance | TimeoutKind::Ongoing => {
                    warn!(timeout = %kind, state = %self.state.id(), "Timeout reached");
                }
                TimeoutKind::Contactor => {
                    error!(state = %self.state.id(), "Contactor timeout reached, opening contactor");
                    self.ctx.feedback.signal(Signal::AcOpenContactor);
                }
            }
            self.ctx.timeouts.reset(kind);
        }

        self.ctx.feedback.signal(Signal::DlinkError);
        self.ctx.session_stopped = true;
        Some(expired)
    }

    fn feed(&mut self, ev: Event) {
        if let Transition::To(next) = self.state.feed(&mut self.ctx, ev) {
            info!(from = %self.state.id(), to = %next.id(), "State transition");
            self.state = next;
            self.state.enter(&mut self.ctx);
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_id(&self) -> StateId {
        self.state.id()
    }

    pub fn is_stopped(&self) -> bool {
        self.ctx.session_stopped
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }
}
