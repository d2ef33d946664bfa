//! The tarmac resource pool: an atomic reservation gate over the airport's
//! physical resources.
//!
//! Three semaphores model the physical resources (runways, gates, tower
//! slots). Above them sits a certification ledger: before an aircraft may
//! touch any semaphore, the full set of resources its phase needs must be
//! certified as free in one atomic step. Certification debits the ledger
//! for every class at once or not at all, so no aircraft ever holds one
//! resource while waiting for another that a second aircraft is holding
//! back. That single rule is what keeps the tarmac deadlock-free.
//!
//! # Certified vs. held
//!
//! A certified unit is earmarked in the ledger; a held unit is a semaphore
//! permit. Held never exceeds certified, and certified never exceeds
//! capacity, so a certified acquisition always finds a physical permit
//! waiting. Rollback returns earmarks for units that were certified but
//! never acquired; dropping a [`Holdings`] permit returns the physical
//! unit, and the paired [`ResourcePool::release`] call returns the earmark.
//!
//! # Priority at the gate
//!
//! The gate is also where class priority is enforced: a Domestic aircraft
//! is refused certification while any International aircraft is contending,
//! unless the monitor has raised a critical alert for it or granted its
//! aging override. Waiters park on a notifier and re-probe, so an alert
//! raised mid-wait takes effect on the next pass.

use std::sync::Arc;

use tokio::sync::{Mutex, Notify, OwnedSemaphorePermit, Semaphore};
use tokio::time::{self, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::aircraft::{AircraftId, AircraftRegistry, FlightClass};
use crate::arbiter::PriorityArbiter;
use crate::config::{SimulationConfig, WAIT_SLICE_MS};
use crate::error::ReserveError;
use crate::phase::{ResourceClass, ResourceNeed};

// =============================================================================
// Certification Ledger
// =============================================================================

/// Book-keeping for certified units, one counter per resource class.
///
/// Plain synchronous arithmetic; the pool guards it with a lock. Kept
/// separate so the all-or-nothing rule can be tested without a runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Ledger {
    free: [usize; 3],
    capacity: [usize; 3],
}

impl Ledger {
    fn new(capacity: [usize; 3]) -> Self {
        Self {
            free: capacity,
            capacity,
        }
    }

    fn free(&self, class: ResourceClass) -> usize {
        self.free[class as usize]
    }

    fn capacity(&self, class: ResourceClass) -> usize {
        self.capacity[class as usize]
    }

    /// True if one unit of every class in `need` is free.
    fn can_grant(&self, need: ResourceNeed) -> bool {
        need.classes().all(|class| self.free(class) > 0)
    }

    /// Earmarks one unit of every class in `need`. Callers check
    /// [`Ledger::can_grant`] under the same lock first.
    fn debit(&mut self, need: ResourceNeed) {
        debug_assert!(self.can_grant(need));
        for class in need.classes() {
            self.free[class as usize] -= 1;
        }
    }

    /// Returns one unit of every class in `need`. Crediting past
    /// capacity is a bookkeeping bug upstream.
    fn credit(&mut self, need: ResourceNeed) {
        for class in need.classes() {
            debug_assert!(self.free(class) < self.capacity(class));
            self.free[class as usize] += 1;
        }
    }
}

// =============================================================================
// Resource Pool
// =============================================================================

/// The shared pool of airport resources, with the certification gate in
/// front of the physical semaphores.
#[derive(Debug)]
pub struct ResourcePool {
    ledger: Mutex<Ledger>,
    runways: Arc<Semaphore>,
    gates: Arc<Semaphore>,
    tower_slots: Arc<Semaphore>,
    capacity: [usize; 3],

    /// Signalled whenever the ledger gains units or a waiter's flags may
    /// have changed; parked reservations re-probe on it.
    changed: Notify,

    registry: Arc<AircraftRegistry>,
    arbiter: Arc<PriorityArbiter>,
    shutdown: CancellationToken,
}

impl ResourcePool {
    /// Creates the pool from the configured capacities.
    ///
    /// A capacity of zero is legal: that class simply never certifies, and
    /// reservations needing it time out.
    pub fn new(
        config: &SimulationConfig,
        registry: Arc<AircraftRegistry>,
        arbiter: Arc<PriorityArbiter>,
        shutdown: CancellationToken,
    ) -> Self {
        let capacity = [config.runways, config.gates, config.tower_slots];
        Self {
            ledger: Mutex::new(Ledger::new(capacity)),
            runways: Arc::new(Semaphore::new(config.runways)),
            gates: Arc::new(Semaphore::new(config.gates)),
            tower_slots: Arc::new(Semaphore::new(config.tower_slots)),
            capacity,
            changed: Notify::new(),
            registry,
            arbiter,
            shutdown,
        }
    }

    fn semaphore(&self, class: ResourceClass) -> &Arc<Semaphore> {
        match class {
            ResourceClass::Runway => &self.runways,
            ResourceClass::Gate => &self.gates,
            ResourceClass::TowerSlot => &self.tower_slots,
        }
    }

    /// Configured capacity for one class.
    pub fn capacity(&self, class: ResourceClass) -> usize {
        self.capacity[class as usize]
    }

    /// Physically free units of one class (permits not currently held).
    pub fn available(&self, class: ResourceClass) -> usize {
        self.semaphore(class).available_permits()
    }

    /// Certifies the full `need` atomically, or fails within `timeout`.
    ///
    /// The loop re-reads the aircraft's flags on every pass: a failure
    /// state declared by the monitor aborts the wait, and a critical alert
    /// or aging override lifts the Domestic hold-back from then on. An
    /// empty need certifies immediately.
    pub async fn reserve(
        &self,
        id: AircraftId,
        need: ResourceNeed,
        timeout: Duration,
    ) -> Result<(), ReserveError> {
        if need.is_empty() {
            return Ok(());
        }
        let deadline = Instant::now() + timeout;
        loop {
            if self.shutdown.is_cancelled() {
                return Err(ReserveError::SimulationEnded);
            }
            let probe = self.registry.probe(id).await;
            if probe.failed {
                return Err(ReserveError::AircraftFailed);
            }
            // Contention is read before the ledger lock; the lock order is
            // arbiter, then ledger, everywhere in the crate.
            let internationals = self.arbiter.contending(FlightClass::International).await;
            {
                let mut ledger = self.ledger.lock().await;
                let held_back = probe.class == FlightClass::Domestic
                    && !probe.critical
                    && !probe.has_override
                    && internationals > 0;
                if !held_back && ledger.can_grant(need) {
                    ledger.debit(need);
                    trace!(aircraft = %id, need = %need, "reservation certified");
                    return Ok(());
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ReserveError::Timeout);
            }
            // Park until something changes. The slice bounds a missed
            // notification; deadline checks stay exact.
            let slice = Duration::from_millis(WAIT_SLICE_MS).min(deadline - now);
            tokio::select! {
                _ = self.changed.notified() => {}
                _ = time::sleep(slice) => {}
            }
        }
    }

    /// Takes the physical permit for one certified unit.
    ///
    /// After certification this does not contend with uncertified traffic,
    /// so the timeout only fires if the simulation is wedged.
    pub async fn acquire(
        &self,
        class: ResourceClass,
        timeout: Duration,
    ) -> Result<OwnedSemaphorePermit, ReserveError> {
        match time::timeout(timeout, self.semaphore(class).clone().acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(ReserveError::SimulationEnded),
            Err(_) => Err(ReserveError::Timeout),
        }
    }

    /// Returns earmarks to the ledger and wakes parked reservations.
    ///
    /// This credits the certification layer only. Physical units travel
    /// back through permit drops; [`Holdings::release`] pairs the two.
    pub async fn release(&self, need: ResourceNeed) {
        if need.is_empty() {
            return;
        }
        {
            let mut ledger = self.ledger.lock().await;
            ledger.credit(need);
        }
        self.changed.notify_waiters();
    }

    /// Wakes every parked reservation so it re-probes its flags. The
    /// monitor calls this after raising alerts or declaring failures.
    pub fn wake_waiters(&self) {
        self.changed.notify_waiters();
    }

    /// Closes the physical semaphores and wakes all waiters. In-flight
    /// acquisitions fail with [`ReserveError::SimulationEnded`]; permits
    /// already held remain valid until dropped.
    pub fn close(&self) {
        self.runways.close();
        self.gates.close();
        self.tower_slots.close();
        self.changed.notify_waiters();
    }
}

// =============================================================================
// Holdings
// =============================================================================

/// The permits one aircraft currently holds.
///
/// At most one permit per class. Dropping the whole struct returns the
/// physical units but not the earmarks, so workers release through
/// [`Holdings::release`] / [`Holdings::release_all`] on every path that
/// matters; the drop impl is only the backstop for a panicking task.
#[derive(Debug, Default)]
pub struct Holdings {
    runway: Option<OwnedSemaphorePermit>,
    gate: Option<OwnedSemaphorePermit>,
    tower_slot: Option<OwnedSemaphorePermit>,
}

impl Holdings {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, class: ResourceClass) -> &mut Option<OwnedSemaphorePermit> {
        match class {
            ResourceClass::Runway => &mut self.runway,
            ResourceClass::Gate => &mut self.gate,
            ResourceClass::TowerSlot => &mut self.tower_slot,
        }
    }

    /// Stores a freshly acquired permit.
    pub fn store(&mut self, class: ResourceClass, permit: OwnedSemaphorePermit) {
        *self.slot_mut(class) = Some(permit);
    }

    /// True if a permit for `class` is held.
    pub fn holds(&self, class: ResourceClass) -> bool {
        match class {
            ResourceClass::Runway => self.runway.is_some(),
            ResourceClass::Gate => self.gate.is_some(),
            ResourceClass::TowerSlot => self.tower_slot.is_some(),
        }
    }

    /// The set of classes currently held.
    pub fn held(&self) -> ResourceNeed {
        let mut need = ResourceNeed::none();
        for class in ResourceClass::ALL {
            if self.holds(class) {
                need.insert(class);
            }
        }
        need
    }

    /// Releases one class: drops the physical permit and returns the
    /// earmark. No-op if the class is not held.
    pub async fn release(&mut self, class: ResourceClass, pool: &ResourcePool) {
        if let Some(permit) = self.slot_mut(class).take() {
            drop(permit);
            pool.release(ResourceNeed::of(&[class])).await;
        }
    }

    /// Releases everything held, in the global resource order.
    pub async fn release_all(&mut self, pool: &ResourcePool) {
        for class in ResourceClass::ALL {
            self.release(class, pool).await;
        }
    }
}
