//! Pluggable on-tarmac work.
//!
//! A [`PhaseWork`] implementation supplies the time an aircraft actually
//! spends on each phase while its resources are held, plus the ground
//! pause between disembarkation and takeoff. The engine treats it as an
//! opaque black box, so simulations can swap in jittered, scripted, or
//! stalling workloads without touching the flight protocol.

use std::future::Future;
use std::pin::Pin;

use tokio::time::{self, Duration};

use crate::phase::PhaseKind;

/// Default landing roll, in seconds.
pub const DEFAULT_LANDING_SECS: u64 = 3;

/// Default disembarkation time at the gate, in seconds.
pub const DEFAULT_DISEMBARK_SECS: u64 = 5;

/// Default takeoff roll, in seconds.
pub const DEFAULT_TAKEOFF_SECS: u64 = 3;

/// Default ground turnaround between disembarkation and takeoff, in seconds.
pub const DEFAULT_TURNAROUND_SECS: u64 = 2;

/// The work an aircraft performs while holding a phase's resources.
///
/// The trait uses boxed future return types so workers can share one
/// implementation behind a trait object.
pub trait PhaseWork: Send + Sync {
    /// Performs the body of `phase`. Resources for the phase are held for
    /// the full duration of the returned future.
    fn perform(&self, phase: PhaseKind) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// The ground pause between disembarkation and takeoff. No resources
    /// are held while this runs.
    fn turnaround(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Fixed-duration work: each phase takes a configured time, every flight.
#[derive(Clone, Copy, Debug)]
pub struct ScheduledWork {
    landing: Duration,
    disembarkation: Duration,
    takeoff: Duration,
    turnaround: Duration,
}

impl ScheduledWork {
    pub fn new(
        landing: Duration,
        disembarkation: Duration,
        takeoff: Duration,
        turnaround: Duration,
    ) -> Self {
        Self {
            landing,
            disembarkation,
            takeoff,
            turnaround,
        }
    }

    /// The configured duration for one phase body.
    pub fn duration(&self, phase: PhaseKind) -> Duration {
        match phase {
            PhaseKind::Landing => self.landing,
            PhaseKind::Disembarkation => self.disembarkation,
            PhaseKind::Takeoff => self.takeoff,
        }
    }

    /// The configured ground pause.
    pub fn turnaround_time(&self) -> Duration {
        self.turnaround
    }
}

impl Default for ScheduledWork {
    fn default() -> Self {
        Self {
            landing: Duration::from_secs(DEFAULT_LANDING_SECS),
            disembarkation: Duration::from_secs(DEFAULT_DISEMBARK_SECS),
            takeoff: Duration::from_secs(DEFAULT_TAKEOFF_SECS),
            turnaround: Duration::from_secs(DEFAULT_TURNAROUND_SECS),
        }
    }
}

impl PhaseWork for ScheduledWork {
    fn perform(&self, phase: PhaseKind) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let duration = self.duration(phase);
        Box::pin(async move { time::sleep(duration).await })
    }

    fn turnaround(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let duration = self.turnaround;
        Box::pin(async move { time::sleep(duration).await })
    }
}
