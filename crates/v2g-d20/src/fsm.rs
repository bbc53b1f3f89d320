//! fsm - State contract and transitions
//!
//! Each protocol state is a variant of [`State`]. The current state is fed
//! events and answers with a [`Transition`]:
//!
//! ```text
//!            enter()                 feed(ev)
//!   State ───────────► (current) ───────────► Transition::Stay
//!                          ▲                  Transition::To(next)
//!                          │                          │
//!                          └──── next.enter() ◄───────┘   predecessor dropped
//! ```

use std::fmt;

use crate::context::Context;
use crate::states::{AcChargeLoop, PowerDelivery, SessionStop};

/// What woke the state machine up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Local instruction from the charger application is in the context
    ControlMessage,
    /// Decoded request is waiting in the context
    V2gtpMessage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    PowerDelivery,
    AcChargeLoop,
    SessionStop,
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PowerDelivery => "PowerDelivery",
            Self::AcChargeLoop => "AC_ChargeLoop",
            Self::SessionStop => "SessionStop",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum State {
    PowerDelivery(PowerDelivery),
    AcChargeLoop(AcChargeLoop),
    SessionStop(SessionStop),
}

impl State {
    pub fn id(&self) -> StateId {
        match self {
            Self::PowerDelivery(_) => StateId::PowerDelivery,
            Self::AcChargeLoop(_) => StateId::AcChargeLoop,
            Self::SessionStop(_) => StateId::SessionStop,
        }
    }

    /// Runs once, right after the state becomes current
    pub fn enter(&mut self, ctx: &mut Context) {
        match self {
            Self::PowerDelivery(state) => state.enter(ctx),
            Self::AcChargeLoop(state) => state.enter(ctx),
            Self::SessionStop(state) => state.enter(ctx),
        }
    }

    pub fn feed(&mut self, ctx: &mut Context, ev: Event) -> Transition {
        match self {
            Self::PowerDelivery(state) => state.feed(ctx, ev),
            Self::AcChargeLoop(state) => state.feed(ctx, ev),
            Self::SessionStop(state) => state.feed(ctx, ev),
        }
    }
}

impl From<PowerDelivery> for State {
    fn from(state: PowerDelivery) -> Self {
        Self::PowerDelivery(state)
    }
}

impl From<AcChargeLoop> for State {
    fn from(state: AcChargeLoop) -> Self {
        Self::AcChargeLoop(state)
    }
}

impl From<SessionStop> for State {
    fn from(state: SessionStop) -> Self {
        Self::SessionStop(state)
    }
}

/// Result of feeding an event
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Transition {
    Stay,
    /// Replace the current state; the old one is dropped
    To(State),
}

impl Transition {
    pub fn to(state: impl Into<State>) -> Self {
        Self::To(state.into())
    }

    pub fn is_stay(&self) -> bool {
        matches!(self, Self::Stay)
    }

    pub fn target(&self) -> Option<StateId> {
        match self {
            Self::Stay => None,
            Self::To(state) => Some(state.id()),
        }
    }
}
