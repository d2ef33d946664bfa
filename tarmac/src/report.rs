//! End-of-run reporting data.
//!
//! `SimulationReport` is the immutable result a finished run hands back:
//! one row per admitted aircraft, the global outcome counters, and the
//! end-of-run availability of every resource class. The core only builds
//! the data; rendering it is the driver's job.

use std::time::Duration;

use crate::aircraft::{Aircraft, AircraftId, AircraftRegistry, AircraftStatus, FlightClass};
use crate::phase::{PhaseKind, ResourceClass};
use crate::pool::ResourcePool;
use crate::stats::{SimStats, StatsSnapshot};

/// One aircraft's final row.
///
/// Phase latencies are `None` for phases that never ran to completion;
/// `total` is `None` for aircraft still active when the run was cut off.
#[derive(Clone, Copy, Debug)]
pub struct AircraftReport {
    pub id: AircraftId,
    pub class: FlightClass,
    pub status: AircraftStatus,
    pub alerts: u32,
    pub landing: Option<Duration>,
    pub disembarkation: Option<Duration>,
    pub takeoff: Option<Duration>,
    /// Admission to terminal status.
    pub total: Option<Duration>,
}

impl AircraftReport {
    fn from_record(record: &Aircraft) -> Self {
        Self {
            id: record.id(),
            class: record.class(),
            status: record.status(),
            alerts: record.alerts(),
            landing: record.window(PhaseKind::Landing).duration(),
            disembarkation: record.window(PhaseKind::Disembarkation).duration(),
            takeoff: record.window(PhaseKind::Takeoff).duration(),
            total: record.total_duration(),
        }
    }

    /// Latency of the given phase, if it completed.
    pub fn phase_duration(&self, kind: PhaseKind) -> Option<Duration> {
        match kind {
            PhaseKind::Landing => self.landing,
            PhaseKind::Disembarkation => self.disembarkation,
            PhaseKind::Takeoff => self.takeoff,
        }
    }
}

/// Availability of one resource class at collection time.
#[derive(Clone, Copy, Debug)]
pub struct ResourceAvailability {
    pub class: ResourceClass,
    pub available: usize,
    pub capacity: usize,
}

impl ResourceAvailability {
    /// True when nothing of this class is still held.
    pub fn fully_restored(&self) -> bool {
        self.available == self.capacity
    }
}

/// Immutable end-of-run report.
#[derive(Clone, Debug)]
pub struct SimulationReport {
    /// Wall time from simulation start to collection.
    pub elapsed: Duration,

    /// One row per admitted aircraft, in admission order.
    pub aircraft: Vec<AircraftReport>,

    /// Global outcome counters.
    pub totals: StatsSnapshot,

    /// Per-class availability at collection time.
    pub availability: Vec<ResourceAvailability>,
}

impl SimulationReport {
    /// Collects the report from a quiesced simulation. Meaningful only
    /// after every worker has been joined.
    pub(crate) async fn collect(
        registry: &AircraftRegistry,
        pool: &ResourcePool,
        stats: &SimStats,
        elapsed: Duration,
    ) -> Self {
        let aircraft = registry
            .snapshot()
            .await
            .iter()
            .map(AircraftReport::from_record)
            .collect();
        let availability = [
            ResourceClass::Runway,
            ResourceClass::Gate,
            ResourceClass::TowerSlot,
        ]
        .into_iter()
        .map(|class| ResourceAvailability {
            class,
            available: pool.available(class),
            capacity: pool.capacity(class),
        })
        .collect();
        Self {
            elapsed,
            aircraft,
            totals: stats.snapshot(),
            availability,
        }
    }

    /// Total aircraft admitted over the run.
    pub fn admitted(&self) -> usize {
        self.aircraft.len()
    }

    /// Aircraft admitted of one class.
    pub fn admitted_of(&self, class: FlightClass) -> usize {
        self.aircraft.iter().filter(|a| a.class == class).count()
    }

    /// Aircraft that never reached a terminal status (cut off by
    /// shutdown mid-lifecycle).
    pub fn unresolved(&self) -> usize {
        self.aircraft
            .iter()
            .filter(|a| !a.status.is_terminal())
            .count()
    }

    /// Fraction of admitted aircraft that completed (0.0 - 1.0).
    pub fn success_rate(&self) -> f64 {
        if self.aircraft.is_empty() {
            0.0
        } else {
            self.totals.successes as f64 / self.aircraft.len() as f64
        }
    }

    /// True when every resource class shows its full capacity available.
    pub fn pool_restored(&self) -> bool {
        self.availability
            .iter()
            .all(ResourceAvailability::fully_restored)
    }
}
