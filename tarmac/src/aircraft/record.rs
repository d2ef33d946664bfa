//! The per-aircraft record: identity, class, and observed timings.

use std::fmt;

use tokio::time::{Duration, Instant};

use crate::phase::{PhaseKind, ResourceNeed};

use super::status::AircraftStatus;

// =============================================================================
// Aircraft Identity
// =============================================================================

/// Unique identifier for an admitted aircraft.
///
/// Ids are minted by the registry in admission order, starting at `A1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AircraftId(u32);

impl AircraftId {
    /// Mints the id for the record stored at `index` in the registry.
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    /// The registry slot this id was minted from.
    pub(crate) fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}

/// Traffic class of a flight. Determines priority and how an exceeded
/// maximum wait is classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlightClass {
    Domestic,
    International,
}

impl FlightClass {
    /// Single-letter code used in compact report rows.
    pub fn code(&self) -> char {
        match self {
            Self::Domestic => 'D',
            Self::International => 'I',
        }
    }
}

impl fmt::Display for FlightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domestic => write!(f, "Domestic"),
            Self::International => write!(f, "International"),
        }
    }
}

// =============================================================================
// Phase Timing
// =============================================================================

/// Observed start/finish times for one phase of one aircraft.
#[derive(Clone, Copy, Debug, Default)]
pub struct PhaseWindow {
    pub(crate) started: Option<Instant>,
    pub(crate) finished: Option<Instant>,
}

impl PhaseWindow {
    /// Wall time the phase took, if it ran to completion.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started, self.finished) {
            (Some(s), Some(f)) => Some(f.duration_since(s)),
            _ => None,
        }
    }

    pub fn started(&self) -> Option<Instant> {
        self.started
    }

    pub fn finished(&self) -> Option<Instant> {
        self.finished
    }

    /// True if the phase has started but not finished.
    pub fn in_progress(&self) -> bool {
        self.started.is_some() && self.finished.is_none()
    }
}

// =============================================================================
// Aircraft Record
// =============================================================================

/// Everything the tower knows about one admitted aircraft.
///
/// Records live in the registry behind a single lock; workers and the
/// monitor both read and write them through registry methods. The struct is
/// `Clone` so callers can snapshot a record without holding the lock.
#[derive(Clone, Debug)]
pub struct Aircraft {
    pub(crate) id: AircraftId,
    pub(crate) class: FlightClass,
    pub(crate) status: AircraftStatus,

    /// Number of critical alerts raised against this aircraft.
    pub(crate) alerts: u32,

    /// Set when the first critical alert grants a permanent priority
    /// override. Never cleared, even when the alert itself resolves.
    pub(crate) priority_override: bool,

    /// Start of the current wait: the moment the current phase was entered.
    /// Phase completion resets it, so ground turnaround between phases is
    /// not billed as waiting.
    pub(crate) last_wait_start: Instant,

    /// Phase currently in progress, if any.
    pub(crate) phase: Option<PhaseKind>,

    /// Set while the aircraft is inside the acquiring window of its
    /// current phase: from its first certification attempt until every
    /// permit is held, or until the attempt aborts. The stuck-phase scan
    /// watches this window, not the phase as a whole, so a slow phase
    /// body is never mistaken for a wedged acquisition.
    pub(crate) acquiring_since: Option<Instant>,

    /// Resources currently held. Advisory, maintained by the worker for
    /// monitor logs and the final report.
    pub(crate) holding: ResourceNeed,

    /// Per-phase timing windows, indexed by [`PhaseKind`].
    pub(crate) windows: [PhaseWindow; 3],

    pub(crate) admitted_at: Instant,

    /// When the record reached a terminal status.
    pub(crate) terminal_at: Option<Instant>,
}

impl Aircraft {
    pub(crate) fn new(id: AircraftId, class: FlightClass, now: Instant) -> Self {
        Self {
            id,
            class,
            status: AircraftStatus::default(),
            alerts: 0,
            priority_override: false,
            last_wait_start: now,
            phase: None,
            acquiring_since: None,
            holding: ResourceNeed::none(),
            windows: [PhaseWindow::default(); 3],
            admitted_at: now,
            terminal_at: None,
        }
    }

    pub fn id(&self) -> AircraftId {
        self.id
    }

    pub fn class(&self) -> FlightClass {
        self.class
    }

    pub fn status(&self) -> AircraftStatus {
        self.status
    }

    pub fn alerts(&self) -> u32 {
        self.alerts
    }

    /// True once the aging override has been granted.
    pub fn has_override(&self) -> bool {
        self.priority_override
    }

    /// Phase currently in progress, if any.
    pub fn phase(&self) -> Option<PhaseKind> {
        self.phase
    }

    /// Resources held at the time of the snapshot.
    pub fn holding(&self) -> ResourceNeed {
        self.holding
    }

    /// Timing window for the given phase.
    pub fn window(&self, kind: PhaseKind) -> PhaseWindow {
        self.windows[kind as usize]
    }

    pub fn admitted_at(&self) -> Instant {
        self.admitted_at
    }

    /// Total time from admission to the terminal status, if reached.
    pub fn total_duration(&self) -> Option<Duration> {
        self.terminal_at
            .map(|t| t.duration_since(self.admitted_at))
    }
}
