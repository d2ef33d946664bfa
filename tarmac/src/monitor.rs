//! Starvation and deadlock monitor.
//!
//! An independent periodic task that sweeps the registry and reclassifies
//! aircraft that have stopped making progress. Two detectors run in every
//! sweep:
//!
//! - The **wait rule** watches `wait = now - last_wait_start`. Crossing
//!   the alert threshold raises a critical alert and grants the permanent
//!   aging override; crossing the maximum wait is terminal, split by
//!   class (Domestic starve and count as accidents, International are
//!   written off as deadlocked).
//! - The **stuck-acquisition scan** watches the acquiring window. An
//!   aircraft that has been certifying or collecting permits past the
//!   stuck limit is written off as deadlocked regardless of class. With
//!   sane capacities and respected timeouts this detector never fires; it
//!   exists to catch hold-and-wait bugs independently of the wait rule.
//!
//! When both detectors have crossed by the time a sweep looks, the one
//! whose deadline was crossed earlier wins; an exact tie falls to the
//! wait rule.
//!
//! The monitor only flips status flags and counters. It never releases
//! resources; each worker unwinds its own holdings when it observes the
//! ruling at its next checkpoint.

use std::sync::Arc;

use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::aircraft::{
    transition, Aircraft, AircraftRegistry, AircraftStatus, FlightClass, StatusEvent,
};
use crate::arbiter::PriorityArbiter;
use crate::config::SimulationConfig;
use crate::phase::ResourceClass;
use crate::pool::ResourcePool;
use crate::stats::SimStats;

/// Which detector condemned an aircraft.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Ruling {
    /// The global wait bound was exceeded.
    WaitExceeded,

    /// The acquiring window outlived the stuck limit.
    StuckAcquiring,
}

/// The periodic starvation/deadlock monitor.
pub struct StarvationMonitor {
    registry: Arc<AircraftRegistry>,
    pool: Arc<ResourcePool>,
    arbiter: Arc<PriorityArbiter>,
    stats: Arc<SimStats>,
    interval: Duration,
    alert_threshold: Duration,
    max_wait: Duration,
    stuck_phase_limit: Duration,
}

impl StarvationMonitor {
    pub fn new(
        config: &SimulationConfig,
        registry: Arc<AircraftRegistry>,
        pool: Arc<ResourcePool>,
        arbiter: Arc<PriorityArbiter>,
        stats: Arc<SimStats>,
    ) -> Self {
        Self {
            registry,
            pool,
            arbiter,
            stats,
            interval: config.monitor_interval,
            alert_threshold: config.alert_threshold,
            max_wait: config.max_wait,
            stuck_phase_limit: config.stuck_phase_limit,
        }
    }

    /// Runs sweeps on the configured cadence until cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.interval.as_secs(),
            alert_secs = self.alert_threshold.as_secs(),
            max_wait_secs = self.max_wait.as_secs(),
            stuck_secs = self.stuck_phase_limit.as_secs(),
            "starvation monitor started"
        );
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => self.sweep().await,
            }
        }
        debug!("starvation monitor stopped");
    }

    /// One pass over every record. Exposed to the rest of the crate so
    /// tests can drive sweeps without the ticker.
    pub(crate) async fn sweep(&self) {
        let now = Instant::now();
        let mut disturbed = false;

        self.registry
            .for_each_mut(|record| {
                if record.status.is_terminal() {
                    return;
                }
                if let Some(ruling) = self.classify(record, now) {
                    self.condemn(record, ruling, now);
                    disturbed = true;
                    return;
                }

                let waited = now.duration_since(record.last_wait_start);
                if waited >= self.alert_threshold && record.status == AircraftStatus::Pending {
                    record.status = transition(record.status, StatusEvent::AlertRaised);
                    record.alerts += 1;
                    self.stats.record_alert();
                    warn!(
                        aircraft = %record.id,
                        class = %record.class,
                        waited_secs = waited.as_secs(),
                        alerts = record.alerts,
                        "critical alert raised"
                    );
                    if !record.priority_override {
                        record.priority_override = true;
                        self.stats.record_override();
                        info!(aircraft = %record.id, "aging override granted");
                    }
                    disturbed = true;
                }
            })
            .await;

        // Waiters re-probe their flags once the lock is gone.
        if disturbed {
            self.pool.wake_waiters();
            self.arbiter.wake_all();
        }

        debug!(
            runways_free = self.pool.available(ResourceClass::Runway),
            gates_free = self.pool.available(ResourceClass::Gate),
            tower_free = self.pool.available(ResourceClass::TowerSlot),
            "monitor sweep complete"
        );
    }

    /// Decides whether a record has crossed a terminal deadline, and which
    /// detector's deadline was crossed first.
    fn classify(&self, record: &Aircraft, now: Instant) -> Option<Ruling> {
        let wait_deadline = record.last_wait_start + self.max_wait;
        let wait_crossed = now >= wait_deadline;

        let stuck_deadline = record
            .acquiring_since
            .map(|since| since + self.stuck_phase_limit)
            .filter(|deadline| now >= *deadline);

        match (wait_crossed, stuck_deadline) {
            (true, Some(stuck)) if stuck < wait_deadline => Some(Ruling::StuckAcquiring),
            (true, _) => Some(Ruling::WaitExceeded),
            (false, Some(_)) => Some(Ruling::StuckAcquiring),
            (false, None) => None,
        }
    }

    /// Applies a terminal ruling to one record and pairs it with its
    /// counter increment.
    fn condemn(&self, record: &mut Aircraft, ruling: Ruling, now: Instant) {
        let event = match (ruling, record.class) {
            (Ruling::WaitExceeded, FlightClass::Domestic) => StatusEvent::StarvationDeclared,
            (Ruling::WaitExceeded, FlightClass::International) => StatusEvent::DeadlockDeclared,
            (Ruling::StuckAcquiring, _) => StatusEvent::DeadlockDeclared,
        };
        record.status = transition(record.status, event);
        record.terminal_at = Some(now);

        let waited = now.duration_since(record.last_wait_start);
        match event {
            StatusEvent::StarvationDeclared => {
                self.stats.record_starved();
                error!(
                    aircraft = %record.id,
                    class = %record.class,
                    waited_secs = waited.as_secs(),
                    holding = %record.holding,
                    "starved of resources, declaring accident"
                );
            }
            _ => {
                self.stats.record_deadlocked();
                error!(
                    aircraft = %record.id,
                    class = %record.class,
                    waited_secs = waited.as_secs(),
                    holding = %record.holding,
                    stuck = ruling == Ruling::StuckAcquiring,
                    "deadlocked, written off"
                );
            }
        }
    }
}
