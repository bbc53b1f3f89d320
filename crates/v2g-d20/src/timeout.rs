//! timeout - Protocol timeout tracker
//!
//! One optional deadline per [`TimeoutKind`], stored in a fixed array indexed
//! by the kind's ordinal.
//!
//! ```text
//!   start(kind, ms) ──► slots[kind] = Some(deadline)   (no-op if armed)
//!   stop(kind)      ──► slots[kind] = None             (warns if idle)
//!   reset(kind)     ──► slots[kind] = None             (silent)
//!   check()         ──► expired kinds, earliest deadline first
//! ```
//!
//! Time is read through a [`Clock`] so tests can drive it by hand.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::warn;

// =============================================================================
// Clock
// =============================================================================

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    /// Time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}

// =============================================================================
// Kinds and deadlines
// =============================================================================

/// Protocol timeouts tracked per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum TimeoutKind {
    /// Between a response and the next request
    Sequence = 0,
    /// Time the EVSE may take to answer
    Performance = 1,
    /// Overall limit on a message repeated with `Ongoing` processing
    Ongoing = 2,
    /// Contactor switching must complete within this
    Contactor = 3,
}

/// Number of [`TimeoutKind`] variants
pub const TIMEOUT_KIND_COUNT: usize = 4;

const _: () = assert!(TIMEOUT_KIND_COUNT == TimeoutKind::Contactor as usize + 1);

impl TimeoutKind {
    pub const ALL: [TimeoutKind; TIMEOUT_KIND_COUNT] = [
        TimeoutKind::Sequence,
        TimeoutKind::Performance,
        TimeoutKind::Ongoing,
        TimeoutKind::Contactor,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Sequence => "SEQUENCE",
            Self::Performance => "PERFORMANCE",
            Self::Ongoing => "ONGOING",
            Self::Contactor => "CONTACTOR",
        };
        f.write_str(s)
    }
}

/// An armed deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    started: Instant,
    duration: Duration,
}

impl Timeout {
    pub fn new(started: Instant, duration: Duration) -> Self {
        Self { started, duration }
    }

    pub fn timeout_point(&self) -> Instant {
        self.started + self.duration
    }

    pub fn is_reached(&self, now: Instant) -> bool {
        now >= self.timeout_point()
    }
}

// =============================================================================
// Tracker
// =============================================================================

pub struct Timeouts {
    slots: [Option<Timeout>; TIMEOUT_KIND_COUNT],
    clock: Arc<dyn Clock>,
}

impl Timeouts {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: [None; TIMEOUT_KIND_COUNT],
            clock,
        }
    }

    /// Arm `kind` to expire `duration_ms` from now.
    ///
    /// An already armed kind keeps its original deadline.
    pub fn start(&mut self, kind: TimeoutKind, duration_ms: u64) {
        let slot = &mut self.slots[kind.index()];
        if slot.is_some() {
            warn!(timeout = %kind, "Timeout already started, keeping original deadline");
            return;
        }
        *slot = Some(Timeout::new(
            self.clock.now(),
            Duration::from_millis(duration_ms),
        ));
    }

    pub fn stop(&mut self, kind: TimeoutKind) {
        if self.slots[kind.index()].take().is_none() {
            warn!(timeout = %kind, "Stopping timeout that was not started");
        }
    }

    pub fn reset(&mut self, kind: TimeoutKind) {
        self.slots[kind.index()] = None;
    }

    pub fn is_active(&self, kind: TimeoutKind) -> bool {
        self.slots[kind.index()].is_some()
    }

    /// Deadline of `kind`, if armed
    pub fn deadline(&self, kind: TimeoutKind) -> Option<Instant> {
        self.slots[kind.index()].map(|t| t.timeout_point())
    }

    /// Kinds whose deadline has passed, earliest deadline first.
    ///
    /// Kinds sharing a deadline are all returned. Expired kinds stay armed
    /// until stopped or reset.
    pub fn check(&self) -> Option<Vec<TimeoutKind>> {
        let now = self.clock.now();

        let mut expired: Vec<(Instant, TimeoutKind)> = TimeoutKind::ALL
            .iter()
            .filter_map(|&kind| {
                self.slots[kind.index()]
                    .filter(|t| t.is_reached(now))
                    .map(|t| (t.timeout_point(), kind))
            })
            .collect();

        if expired.is_empty() {
            return None;
        }

        expired.sort_by_key(|(point, _)| *point);
        Some(expired.into_iter().map(|(_, kind)| kind).collect())
    }
}

impl fmt::Debug for Timeouts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeouts")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}
