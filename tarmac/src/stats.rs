//! Process-wide simulation counters.
//!
//! Every terminal status transition is paired with exactly one counter
//! increment at the site that performed the transition, so the final
//! report's totals can be audited against the per-aircraft records.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared atomic counters for a simulation run.
#[derive(Debug, Default)]
pub struct SimStats {
    successes: AtomicU64,
    failures: AtomicU64,
    critical_alerts: AtomicU64,
    starved: AtomicU64,
    deadlocked: AtomicU64,
    accidents: AtomicU64,
    aging_overrides: AtomicU64,
}

impl SimStats {
    /// Creates a zeroed counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed lifecycle (all three phases).
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a reservation-timeout failure.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a critical alert being raised.
    pub fn record_alert(&self) {
        self.critical_alerts.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a Domestic aircraft starving out. Counts as an accident.
    pub fn record_starved(&self) {
        self.starved.fetch_add(1, Ordering::Relaxed);
        self.accidents.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an International aircraft being written off as deadlocked.
    /// Not an accident.
    pub fn record_deadlocked(&self) {
        self.deadlocked.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an aging override being granted.
    pub fn record_override(&self) {
        self.aging_overrides.fetch_add(1, Ordering::Relaxed);
    }

    /// Successful lifecycles so far.
    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }

    /// Timeout failures so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Critical alerts raised so far.
    pub fn critical_alerts(&self) -> u64 {
        self.critical_alerts.load(Ordering::Relaxed)
    }

    /// Domestic aircraft starved out so far.
    pub fn starved(&self) -> u64 {
        self.starved.load(Ordering::Relaxed)
    }

    /// International aircraft written off so far.
    pub fn deadlocked(&self) -> u64 {
        self.deadlocked.load(Ordering::Relaxed)
    }

    /// Accidents (crashes) so far.
    pub fn accidents(&self) -> u64 {
        self.accidents.load(Ordering::Relaxed)
    }

    /// Aging overrides granted so far.
    pub fn aging_overrides(&self) -> u64 {
        self.aging_overrides.load(Ordering::Relaxed)
    }

    /// Takes a point-in-time copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            successes: self.successes(),
            failures: self.failures(),
            critical_alerts: self.critical_alerts(),
            starved: self.starved(),
            deadlocked: self.deadlocked(),
            accidents: self.accidents(),
            aging_overrides: self.aging_overrides(),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Successful lifecycles.
    pub successes: u64,

    /// Timeout failures.
    pub failures: u64,

    /// Critical alerts raised.
    pub critical_alerts: u64,

    /// Domestic aircraft starved out.
    pub starved: u64,

    /// International aircraft written off as deadlocked.
    pub deadlocked: u64,

    /// Accidents (every starvation is one; deadlocks are not).
    pub accidents: u64,

    /// Aging overrides granted.
    pub aging_overrides: u64,
}
