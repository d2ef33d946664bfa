//! Priority arbitration between International and Domestic traffic.
//!
//! The arbiter tracks how many aircraft of each class are currently in a
//! reservation wait. Domestic workers consult it before approaching the
//! pool and stand aside while any International aircraft is contending;
//! the pool applies the same rule at the certification gate. The critical
//! alert and the aging override, both recorded on the aircraft itself,
//! lift the rule at both layers.
//!
//! Waiting Domestics park on a notifier. The last contending
//! International to leave wakes all of them at once; a Domestic leaving
//! while no International contends passes its turn to one of them.
//! Standing aside costs no polling in the common case.

use tokio::sync::{Mutex, Notify};
use tokio::time::{self, Duration};

use crate::aircraft::FlightClass;

#[derive(Debug, Default)]
struct Contention {
    domestic: usize,
    international: usize,
}

impl Contention {
    fn slot_mut(&mut self, class: FlightClass) -> &mut usize {
        match class {
            FlightClass::Domestic => &mut self.domestic,
            FlightClass::International => &mut self.international,
        }
    }

    fn get(&self, class: FlightClass) -> usize {
        match class {
            FlightClass::Domestic => self.domestic,
            FlightClass::International => self.international,
        }
    }
}

/// Tracks reservation-wait contention per flight class.
#[derive(Debug, Default)]
pub struct PriorityArbiter {
    counts: Mutex<Contention>,
    domestic_wake: Notify,
}

impl PriorityArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an aircraft as contending for resources.
    pub async fn enter_wait(&self, class: FlightClass) {
        let mut counts = self.counts.lock().await;
        *counts.slot_mut(class) += 1;
    }

    /// Removes an aircraft from the contention count.
    ///
    /// The last International to leave wakes every standing-aside
    /// Domestic. A departing Domestic hands its turn to one parked
    /// Domestic instead, and only while no International is contending.
    pub async fn leave_wait(&self, class: FlightClass) {
        let internationals = {
            let mut counts = self.counts.lock().await;
            let slot = counts.slot_mut(class);
            debug_assert!(*slot > 0, "leave_wait without matching enter_wait");
            *slot = slot.saturating_sub(1);
            counts.international
        };
        if internationals > 0 {
            return;
        }
        match class {
            FlightClass::International => self.domestic_wake.notify_waiters(),
            FlightClass::Domestic => self.domestic_wake.notify_one(),
        }
    }

    /// Number of aircraft of `class` currently contending.
    pub async fn contending(&self, class: FlightClass) -> usize {
        self.counts.lock().await.get(class)
    }

    /// True if an aircraft of `class` should stand aside right now.
    /// Override and alert exemptions are the caller's to check; the
    /// arbiter only knows contention.
    pub async fn should_yield(&self, class: FlightClass) -> bool {
        class == FlightClass::Domestic && self.counts.lock().await.international > 0
    }

    /// Parks a standing-aside Domestic until Internationals drain or the
    /// slice elapses, whichever comes first. Callers re-check
    /// [`PriorityArbiter::should_yield`] after every return.
    pub async fn wait_for_turn(&self, slice: Duration) {
        tokio::select! {
            _ = self.domestic_wake.notified() => {}
            _ = time::sleep(slice) => {}
        }
    }

    /// Wakes every parked Domestic so it re-checks its exemptions. The
    /// monitor calls this after granting alerts or overrides.
    pub fn wake_all(&self) {
        self.domestic_wake.notify_waiters();
    }
}
