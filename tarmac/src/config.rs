//! Simulation configuration.
//!
//! This module contains the [`SimulationConfig`] struct and the default
//! constants for capacities and timing thresholds. One time unit is one
//! second of Tokio time, so paused-clock tests can drive every threshold.

use crate::phase::ResourceClass;
use std::time::Duration;

// =============================================================================
// Configuration Constants
// =============================================================================

/// Default number of runways.
pub const DEFAULT_RUNWAY_CAPACITY: usize = 3;

/// Default number of gates.
pub const DEFAULT_GATE_CAPACITY: usize = 5;

/// Default number of concurrent tower slots.
pub const DEFAULT_TOWER_SLOT_CAPACITY: usize = 2;

/// Default simulation duration in seconds (driver arrival window).
pub const DEFAULT_SIM_DURATION_SECS: u64 = 300;

/// Default bound on a single reservation or acquisition wait.
pub const DEFAULT_RESERVE_TIMEOUT_SECS: u64 = 10;

/// Wait threshold at which an aircraft is flagged with a critical alert.
pub const DEFAULT_ALERT_THRESHOLD_SECS: u64 = 60;

/// Wait threshold at which an aircraft is reclassified as starved/deadlocked.
pub const DEFAULT_MAX_WAIT_SECS: u64 = 90;

/// How long a single phase may stay in progress before the stuck-phase scan
/// reclassifies the aircraft as deadlocked.
pub const DEFAULT_STUCK_PHASE_LIMIT_SECS: u64 = 30;

/// Monitor sweep interval.
pub const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 5;

/// How long the gate stays occupied after the disembarkation body completes.
pub const DEFAULT_GATE_OCCUPANCY_SECS: u64 = 4;

/// Default cap on admitted aircraft.
pub const DEFAULT_MAX_AIRCRAFT: usize = 1000;

/// Upper bound on a single blocked-wait slice; every waiter re-checks
/// shutdown and terminal status at least this often.
pub const WAIT_SLICE_MS: u64 = 250;

// =============================================================================
// Simulation Configuration
// =============================================================================

/// Configuration for a simulation run.
///
/// Capacities of zero are legal (they model a closed facility and make every
/// reservation for that class time out); timing fields must be non-zero for
/// the monitor thresholds to mean anything.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Runway capacity.
    pub runways: usize,

    /// Gate capacity.
    pub gates: usize,

    /// Tower concurrent-handling capacity.
    pub tower_slots: usize,

    /// How long the driver keeps admitting aircraft.
    pub sim_duration: Duration,

    /// Bound on a single reservation-gate or semaphore wait.
    pub reserve_timeout: Duration,

    /// Wait without progress before a critical alert fires.
    pub alert_threshold: Duration,

    /// Wait without progress before terminal reclassification.
    pub max_wait: Duration,

    /// In-progress phase age before the stuck-phase scan fires.
    pub stuck_phase_limit: Duration,

    /// Monitor sweep cadence.
    pub monitor_interval: Duration,

    /// Gate hold time after the disembarkation body completes.
    pub gate_occupancy: Duration,

    /// Cap on admitted aircraft.
    pub max_aircraft: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            runways: DEFAULT_RUNWAY_CAPACITY,
            gates: DEFAULT_GATE_CAPACITY,
            tower_slots: DEFAULT_TOWER_SLOT_CAPACITY,
            sim_duration: Duration::from_secs(DEFAULT_SIM_DURATION_SECS),
            reserve_timeout: Duration::from_secs(DEFAULT_RESERVE_TIMEOUT_SECS),
            alert_threshold: Duration::from_secs(DEFAULT_ALERT_THRESHOLD_SECS),
            max_wait: Duration::from_secs(DEFAULT_MAX_WAIT_SECS),
            stuck_phase_limit: Duration::from_secs(DEFAULT_STUCK_PHASE_LIMIT_SECS),
            monitor_interval: Duration::from_secs(DEFAULT_MONITOR_INTERVAL_SECS),
            gate_occupancy: Duration::from_secs(DEFAULT_GATE_OCCUPANCY_SECS),
            max_aircraft: DEFAULT_MAX_AIRCRAFT,
        }
    }
}

impl SimulationConfig {
    /// Returns the configured capacity for a resource class.
    pub fn capacity(&self, class: ResourceClass) -> usize {
        match class {
            ResourceClass::Runway => self.runways,
            ResourceClass::Gate => self.gates,
            ResourceClass::TowerSlot => self.tower_slots,
        }
    }
}
