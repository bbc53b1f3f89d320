//! v2g-d20 - ISO 15118-20 EVSE session state machine
//!
//! Runs the part of a -20 session from PowerDelivery to SessionStop for AC
//! energy transfer, including the AC charge loop, and tracks the protocol
//! timeouts that can end a session early.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                      StateMachine                         │
//! │  handle_request / handle_control / poll_timeouts          │
//! └───────────────┬───────────────────────────┬───────────────┘
//!                 │ feed(Event)               │ check()
//! ┌───────────────▼──────────────┐   ┌────────▼──────────────┐
//! │ State                        │   │ Timeouts              │
//! │  PowerDelivery               │   │  Sequence Performance │
//! │  AcChargeLoop                │   │  Ongoing  Contactor   │
//! │  SessionStop                 │   └───────────────────────┘
//! └───────────────┬──────────────┘
//!                 │ pull_request / respond / feedback
//! ┌───────────────▼───────────────────────────────────────────┐
//! │ Context: Session, SessionConfig, MessageExchange, Feedback│
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod feedback;
pub mod fsm;
pub mod states;
pub mod timeout;

pub use config::{EvseSetupConfig, SessionConfig, TimeoutConfig};
pub use context::{Context, ControlEvent, SelectedServices, Session};
pub use driver::StateMachine;
pub use error::ConfigError;
pub use feedback::{
    AcChargeLoopData, ChannelFeedback, Feedback, FeedbackEvent, RecordingFeedback, Signal,
};
pub use fsm::{Event, State, StateId, Transition};
pub use timeout::{Clock, ManualClock, SystemClock, TimeoutKind, Timeouts};
