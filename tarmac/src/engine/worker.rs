//! The per-aircraft flight worker.
//!
//! One worker task owns one aircraft's whole lifecycle. For each phase it
//! runs the same protocol:
//!
//! 1. Stamp the phase as entered (this also starts the wait clock).
//! 2. Register with the arbiter for the length of the phase, and stand
//!    aside while higher-priority traffic is contending, until exempted
//!    by an alert or override.
//! 3. Certify the phase's remaining resource need at the pool in one
//!    atomic step, bounded by the reserve timeout. Anything still held
//!    from an earlier phase is excluded, never re-reserved.
//! 4. Acquire the physical permits in the global resource order,
//!    skipping classes already held.
//! 5. Perform the phase body, then release. Disembarkation releases the
//!    tower slot first and keeps the gate for the occupancy interval.
//!
//! Every blocking step checks for shutdown and for a failure ruling made
//! by the monitor; any abort after certification squares the ledger by
//! rolling back held permits and unacquired earmarks together.

use std::sync::Arc;

use tokio::time::{self, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::aircraft::{AircraftId, AircraftRegistry, FlightClass, StatusEvent};
use crate::arbiter::PriorityArbiter;
use crate::config::{SimulationConfig, WAIT_SLICE_MS};
use crate::error::ReserveError;
use crate::phase::{PhaseKind, ResourceClass, ResourceNeed};
use crate::pool::{Holdings, ResourcePool};
use crate::stats::SimStats;

use super::work::PhaseWork;

/// Drives one aircraft from admission through takeoff.
pub struct FlightWorker {
    config: SimulationConfig,
    registry: Arc<AircraftRegistry>,
    pool: Arc<ResourcePool>,
    arbiter: Arc<PriorityArbiter>,
    stats: Arc<SimStats>,
    work: Arc<dyn PhaseWork>,
    shutdown: CancellationToken,
}

impl FlightWorker {
    pub fn new(
        config: SimulationConfig,
        registry: Arc<AircraftRegistry>,
        pool: Arc<ResourcePool>,
        arbiter: Arc<PriorityArbiter>,
        stats: Arc<SimStats>,
        work: Arc<dyn PhaseWork>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            registry,
            pool,
            arbiter,
            stats,
            work,
            shutdown,
        }
    }

    /// Runs the full lifecycle. Consumes the worker; every aircraft gets
    /// its own.
    pub async fn run(self, id: AircraftId) {
        match self.fly(id).await {
            Ok(()) => {
                let change = self.registry.apply(id, StatusEvent::Completed).await;
                if change.changed() {
                    self.stats.record_success();
                    info!(aircraft = %id, "flight complete");
                }
            }
            Err(ReserveError::SimulationEnded) => {
                debug!(aircraft = %id, "flight interrupted by shutdown");
            }
            Err(ReserveError::AircraftFailed) => {
                debug!(aircraft = %id, "flight abandoned after failure ruling");
            }
            // Timeout book-keeping happens at the site that observed it.
            Err(ReserveError::Timeout) => {}
        }
    }

    async fn fly(&self, id: AircraftId) -> Result<(), ReserveError> {
        // Holdings outlive any single phase so a resource kept across a
        // phase boundary is skipped, not re-reserved.
        let mut holdings = Holdings::new();
        for phase in PhaseKind::ALL {
            self.run_phase(id, phase, &mut holdings).await?;
            if phase == PhaseKind::Disembarkation {
                tokio::select! {
                    _ = self.work.turnaround() => {}
                    _ = self.shutdown.cancelled() => {
                        self.rollback(id, &mut holdings, ResourceNeed::none()).await;
                        return Err(ReserveError::SimulationEnded);
                    }
                }
                if let Err(err) = self.checkpoint(id).await {
                    self.rollback(id, &mut holdings, ResourceNeed::none()).await;
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    async fn run_phase(
        &self,
        id: AircraftId,
        phase: PhaseKind,
        holdings: &mut Holdings,
    ) -> Result<(), ReserveError> {
        self.registry.phase_started(id, phase).await;
        let class = self.registry.probe(id).await.class;
        let need = phase.requires().minus(holdings.held());
        info!(aircraft = %id, phase = %phase, needs = %need, "phase started");

        // The contention window covers the whole phase, stand-aside
        // through release; aborts unregister on the way out here too.
        self.arbiter.enter_wait(class).await;
        let outcome = self.execute_phase(id, phase, class, need, holdings).await;
        self.arbiter.leave_wait(class).await;
        outcome
    }

    /// Certify, acquire, perform, release, all inside the contention
    /// window opened by `run_phase`.
    async fn execute_phase(
        &self,
        id: AircraftId,
        phase: PhaseKind,
        class: FlightClass,
        need: ResourceNeed,
        holdings: &mut Holdings,
    ) -> Result<(), ReserveError> {
        let certified = self.stand_aside_and_certify(id, class, need).await;
        if let Err(err) = certified {
            self.rollback(id, holdings, ResourceNeed::none()).await;
            if err == ReserveError::Timeout {
                let change = self.registry.apply(id, StatusEvent::TimedOut).await;
                if change.changed() {
                    self.stats.record_failure();
                    warn!(aircraft = %id, phase = %phase, needs = %need, "reservation timed out");
                }
            }
            return Err(err);
        }

        // Certified from here on: every abort path must square the books.
        let mut unacquired = need;
        for &resource in phase.acquisition_order() {
            if holdings.holds(resource) {
                continue;
            }
            if let Err(err) = self.checkpoint(id).await {
                self.rollback(id, holdings, unacquired).await;
                return Err(err);
            }
            match self.pool.acquire(resource, self.config.reserve_timeout).await {
                Ok(permit) => {
                    holdings.store(resource, permit);
                    unacquired.remove(resource);
                    self.registry.set_holding(id, holdings.held()).await;
                    trace!(aircraft = %id, phase = %phase, resource = %resource, "acquired");
                }
                Err(err) => {
                    self.rollback(id, holdings, unacquired).await;
                    if err == ReserveError::Timeout {
                        let change = self.registry.apply(id, StatusEvent::TimedOut).await;
                        if change.changed() {
                            self.stats.record_failure();
                            warn!(
                                aircraft = %id,
                                phase = %phase,
                                resource = %resource,
                                "acquisition timed out"
                            );
                        }
                    }
                    return Err(err);
                }
            }
        }
        debug_assert!(unacquired.is_empty());
        self.registry.acquiring_finished(id).await;

        tokio::select! {
            _ = self.work.perform(phase) => {}
            _ = self.shutdown.cancelled() => {
                self.rollback(id, holdings, ResourceNeed::none()).await;
                return Err(ReserveError::SimulationEnded);
            }
        }
        if let Err(err) = self.checkpoint(id).await {
            self.rollback(id, holdings, ResourceNeed::none()).await;
            return Err(err);
        }

        if phase == PhaseKind::Disembarkation {
            // Tower goes back as soon as the passengers are off; the gate
            // stays occupied while the aircraft is towed clear.
            holdings.release(ResourceClass::TowerSlot, &self.pool).await;
            self.registry.set_holding(id, holdings.held()).await;
            debug!(aircraft = %id, "tower slot released, gate held for unloading");
            tokio::select! {
                _ = time::sleep(self.config.gate_occupancy) => {}
                _ = self.shutdown.cancelled() => {
                    self.rollback(id, holdings, ResourceNeed::none()).await;
                    return Err(ReserveError::SimulationEnded);
                }
            }
        }
        holdings.release_all(&self.pool).await;
        self.registry.set_holding(id, ResourceNeed::none()).await;

        self.registry.phase_finished(id, phase).await;
        let change = self.registry.apply(id, StatusEvent::AlertCleared).await;
        if change.changed() {
            info!(aircraft = %id, phase = %phase, "critical alert resolved by progress");
        }
        info!(aircraft = %id, phase = %phase, "phase complete");
        Ok(())
    }

    /// Stands aside while the arbiter demands it, then certifies `need`.
    ///
    /// The stand-aside is unbounded; a Domestic parked here gets out
    /// through the monitor (alert or override) or not at all. Only the
    /// certification itself is held to the reserve timeout, and only the
    /// certification opens the acquiring window the stuck-phase scan
    /// watches.
    async fn stand_aside_and_certify(
        &self,
        id: AircraftId,
        class: FlightClass,
        need: ResourceNeed,
    ) -> Result<(), ReserveError> {
        loop {
            self.checkpoint(id).await?;
            let probe = self.registry.probe(id).await;
            if probe.critical || probe.has_override {
                break;
            }
            if !self.arbiter.should_yield(class).await {
                break;
            }
            self.arbiter
                .wait_for_turn(Duration::from_millis(WAIT_SLICE_MS))
                .await;
        }
        self.registry.acquiring_started(id).await;
        self.pool.reserve(id, need, self.config.reserve_timeout).await
    }

    /// Returns held permits and unacquired earmarks to the pool.
    async fn rollback(&self, id: AircraftId, holdings: &mut Holdings, unacquired: ResourceNeed) {
        debug!(aircraft = %id, held = %holdings.held(), earmarked = %unacquired, "rolling back");
        holdings.release_all(&self.pool).await;
        self.pool.release(unacquired).await;
        self.registry.acquiring_finished(id).await;
        self.registry.set_holding(id, ResourceNeed::none()).await;
    }

    /// Fails fast if shutdown was signalled or the monitor has ruled this
    /// aircraft failed.
    async fn checkpoint(&self, id: AircraftId) -> Result<(), ReserveError> {
        if self.shutdown.is_cancelled() {
            return Err(ReserveError::SimulationEnded);
        }
        if self.registry.probe(id).await.failed {
            return Err(ReserveError::AircraftFailed);
        }
        Ok(())
    }
}
