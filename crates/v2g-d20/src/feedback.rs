//! Feedback from the state machine to the charger application
//!
//! States report milestones and received EV parameters through the
//! [`Feedback`] trait. Delivery is fire-and-forget.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use v2g_core::{AcReqControlMode, DisplayParameters};

/// Protocol milestones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Signal {
    ChargeLoopStarted,
    ChargeLoopFinished,
    AcCloseContactor,
    AcOpenContactor,
    /// Data link may be torn down, session over
    DlinkTerminate,
    /// Data link must be torn down after a protocol error
    DlinkError,
    /// Data link may sleep, the session can be resumed
    DlinkPause,
}

/// Parameters received in an AC_ChargeLoopReq
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AcChargeLoopData {
    ControlMode(AcReqControlMode),
    MeterInfoRequested(bool),
    DisplayParameters(DisplayParameters),
}

/// Anything a [`Feedback`] implementation can be told
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FeedbackEvent {
    Signal(Signal),
    AcChargeLoop(AcChargeLoopData),
}

pub trait Feedback: Send {
    fn signal(&mut self, signal: Signal);

    fn ac_charge_loop_req(&mut self, data: AcChargeLoopData);
}

/// Forwards every event into a tokio channel
pub struct ChannelFeedback {
    tx: mpsc::UnboundedSender<FeedbackEvent>,
}

impl ChannelFeedback {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FeedbackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: FeedbackEvent) {
        // Receiver gone means nobody is listening anymore
        let _ = self.tx.send(event);
    }
}

impl Feedback for ChannelFeedback {
    fn signal(&mut self, signal: Signal) {
        self.send(FeedbackEvent::Signal(signal));
    }

    fn ac_charge_loop_req(&mut self, data: AcChargeLoopData) {
        self.send(FeedbackEvent::AcChargeLoop(data));
    }
}

/// Keeps every event in a shared log; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingFeedback {
    events: Arc<Mutex<Vec<FeedbackEvent>>>,
}

impl RecordingFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FeedbackEvent> {
        self.events.lock().clone()
    }

    /// Only the signals, in emission order
    pub fn signals(&self) -> Vec<Signal> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                FeedbackEvent::Signal(signal) => Some(*signal),
                FeedbackEvent::AcChargeLoop(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Feedback for RecordingFeedback {
    fn signal(&mut self, signal: Signal) {
        self.events.lock().push(FeedbackEvent::Signal(signal));
    }

    fn ac_charge_loop_req(&mut self, data: AcChargeLoopData) {
        self.events.lock().push(FeedbackEvent::AcChargeLoop(data));
    }
}
