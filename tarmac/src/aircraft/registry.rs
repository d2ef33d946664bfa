//! Shared registry of admitted aircraft.
//!
//! All records live in one `Vec` behind a single async lock. Workers and
//! the starvation monitor mutate records only through the methods here, so
//! every status change funnels through [`transition`] and the terminal
//! states stay write-once. None of the methods hold the lock across an
//! await point.

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::phase::{PhaseKind, ResourceNeed};

use super::record::{Aircraft, AircraftId, FlightClass};
use super::status::{transition, AircraftStatus, StatusChange, StatusEvent};

/// Point-in-time view of the flags the reservation path cares about.
///
/// The pool re-reads this on every pass of its wait loop, because the
/// monitor can raise a critical alert or declare a terminal state while a
/// reservation is still parked.
#[derive(Clone, Copy, Debug)]
pub struct Probe {
    pub class: FlightClass,

    /// True once the record is in any failure state.
    pub failed: bool,

    /// True while the record is in an unresolved critical alert.
    pub critical: bool,

    /// True once the aging override has been granted.
    pub has_override: bool,
}

/// Registry of every aircraft admitted to the simulation.
#[derive(Debug, Default)]
pub struct AircraftRegistry {
    records: Mutex<Vec<Aircraft>>,
}

impl AircraftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a new aircraft, minting its id, unless the registry already
    /// holds `limit` records.
    pub async fn admit(&self, class: FlightClass, limit: usize) -> Option<AircraftId> {
        let mut records = self.records.lock().await;
        if records.len() >= limit {
            return None;
        }
        let id = AircraftId::from_index(records.len());
        records.push(Aircraft::new(id, class, Instant::now()));
        Some(id)
    }

    /// Number of aircraft admitted so far.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Reads the reservation-path flags for one aircraft.
    pub async fn probe(&self, id: AircraftId) -> Probe {
        let records = self.records.lock().await;
        let record = &records[id.index()];
        Probe {
            class: record.class,
            failed: record.status.is_failure(),
            critical: record.status == AircraftStatus::CriticalAlert,
            has_override: record.priority_override,
        }
    }

    pub async fn status(&self, id: AircraftId) -> AircraftStatus {
        self.records.lock().await[id.index()].status
    }

    /// Applies a status event through the transition table.
    ///
    /// Returns the resulting change; callers use [`StatusChange::changed`]
    /// to decide whether counters and logs fire. Stamps the terminal time
    /// the first time a record goes terminal.
    pub async fn apply(&self, id: AircraftId, event: StatusEvent) -> StatusChange {
        let mut records = self.records.lock().await;
        let record = &mut records[id.index()];
        let from = record.status;
        let to = transition(from, event);
        record.status = to;
        if to.is_terminal() && from != to {
            record.terminal_at = Some(Instant::now());
        }
        StatusChange { from, to }
    }

    /// Marks a phase as entered: stamps its window and restarts the wait
    /// clock.
    pub async fn phase_started(&self, id: AircraftId, kind: PhaseKind) {
        let now = Instant::now();
        let mut records = self.records.lock().await;
        let record = &mut records[id.index()];
        record.phase = Some(kind);
        record.acquiring_since = None;
        record.last_wait_start = now;
        record.windows[kind as usize].started = Some(now);
    }

    /// Marks a phase as completed. Completion counts as progress, so the
    /// wait clock restarts.
    pub async fn phase_finished(&self, id: AircraftId, kind: PhaseKind) {
        let now = Instant::now();
        let mut records = self.records.lock().await;
        let record = &mut records[id.index()];
        record.phase = None;
        record.acquiring_since = None;
        record.last_wait_start = now;
        record.windows[kind as usize].finished = Some(now);
    }

    /// Opens the acquiring window: the aircraft has stopped standing aside
    /// and is now certifying and collecting permits.
    pub async fn acquiring_started(&self, id: AircraftId) {
        self.records.lock().await[id.index()].acquiring_since = Some(Instant::now());
    }

    /// Closes the acquiring window, on full acquisition or on abort.
    pub async fn acquiring_finished(&self, id: AircraftId) {
        self.records.lock().await[id.index()].acquiring_since = None;
    }

    /// Records what the aircraft currently holds. Advisory only.
    pub async fn set_holding(&self, id: AircraftId, holding: ResourceNeed) {
        self.records.lock().await[id.index()].holding = holding;
    }

    /// Grants the permanent priority override. Returns true only the first
    /// time, so the override counter fires once per aircraft.
    pub async fn grant_override(&self, id: AircraftId) -> bool {
        let mut records = self.records.lock().await;
        let record = &mut records[id.index()];
        let newly = !record.priority_override;
        record.priority_override = true;
        newly
    }

    /// Copies out every record.
    pub async fn snapshot(&self) -> Vec<Aircraft> {
        self.records.lock().await.clone()
    }

    /// Runs `f` over every record under the lock. Monitor use only; `f`
    /// must not block.
    pub(crate) async fn for_each_mut<F>(&self, mut f: F)
    where
        F: FnMut(&mut Aircraft),
    {
        let mut records = self.records.lock().await;
        for record in records.iter_mut() {
            f(record);
        }
    }
}
