//! Aircraft status and the status transition table.
//!
//! Status is only ever changed through [`transition`], a single total
//! function over (current status, event). This is what makes the "never
//! downgrade a terminal state" rule enforceable in one place: once a record
//! is terminal, every event maps it back onto itself, so a worker and the
//! monitor can race on the same record without ad-hoc compare-and-write
//! rules at each call site.

use std::fmt;

// =============================================================================
// Aircraft Status
// =============================================================================

/// Lifecycle status of an aircraft record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AircraftStatus {
    /// In flight and making progress. The only valid initial status.
    #[default]
    Pending,

    /// Waiting past the alert threshold without progress. Transient: may
    /// resolve back to Pending at the next phase completion, or escalate.
    CriticalAlert,

    /// All three phases completed.
    Success,

    /// A reservation or acquisition wait timed out.
    Failed,

    /// Domestic aircraft that exceeded the maximum wait (fuel exhaustion,
    /// counted as an accident).
    Starved,

    /// International aircraft that exceeded the maximum wait, or any
    /// aircraft caught by the stuck-phase scan (administrative write-off).
    Deadlocked,
}

impl AircraftStatus {
    /// Returns true if this status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failed | Self::Starved | Self::Deadlocked
        )
    }

    /// Returns true for the three failure classifications.
    ///
    /// This is the predicate workers and the pool consult at every
    /// checkpoint: once it holds, the aircraft must unwind without further
    /// resource demands.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Starved | Self::Deadlocked)
    }

    /// Returns true if the aircraft is still in flight.
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for AircraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::CriticalAlert => write!(f, "CriticalAlert"),
            Self::Success => write!(f, "Success"),
            Self::Failed => write!(f, "Failed"),
            Self::Starved => write!(f, "Starved"),
            Self::Deadlocked => write!(f, "Deadlocked"),
        }
    }
}

// =============================================================================
// Status Events
// =============================================================================

/// Events that drive status transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusEvent {
    /// The monitor observed a wait past the alert threshold.
    AlertRaised,

    /// A phase completed while the aircraft was in a critical alert.
    AlertCleared,

    /// All three phases completed.
    Completed,

    /// A reservation or acquisition wait exceeded its bound.
    TimedOut,

    /// The monitor observed a Domestic wait past the maximum.
    StarvationDeclared,

    /// The monitor observed an International wait past the maximum, or a
    /// phase stuck past the stuck-phase limit.
    DeadlockDeclared,
}

/// The outcome of applying an event to a status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before the event.
    pub from: AircraftStatus,

    /// Status after the event.
    pub to: AircraftStatus,
}

impl StatusChange {
    /// Returns true if the event actually moved the status.
    ///
    /// Counter increments are keyed off this, so a transition that lost the
    /// race to an earlier terminal classification is never double-counted.
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// The total transition function: (current status, event) -> next status.
///
/// Terminal states absorb every event. Non-terminal states (Pending,
/// CriticalAlert) move as the event dictates; `AlertRaised` on an already
/// alerted record and `AlertCleared` on a Pending one are idempotent.
pub fn transition(current: AircraftStatus, event: StatusEvent) -> AircraftStatus {
    if current.is_terminal() {
        return current;
    }
    match event {
        StatusEvent::AlertRaised => AircraftStatus::CriticalAlert,
        StatusEvent::AlertCleared => AircraftStatus::Pending,
        StatusEvent::Completed => AircraftStatus::Success,
        StatusEvent::TimedOut => AircraftStatus::Failed,
        StatusEvent::StarvationDeclared => AircraftStatus::Starved,
        StatusEvent::DeadlockDeclared => AircraftStatus::Deadlocked,
    }
}
