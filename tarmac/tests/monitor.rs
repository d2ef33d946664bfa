//! Integration tests for the starvation/deadlock monitor.
//!
//! These tests verify the monitor's escalation ladder against a live
//! simulation:
//! - A stalled phase body riding Pending → CriticalAlert → Starved or
//!   Deadlocked on the class rule, without the monitor touching resources
//! - A wedged acquisition tripping the stuck-phase scan well before the
//!   global wait bound
//! - The fairness guarantee: a Domestic held off by International
//!   contention is alerted at the threshold, granted the aging override,
//!   and completes
//!
//! Run with: `cargo test --test monitor`

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::time::{self, Duration};

use tarmac::aircraft::{AircraftStatus, FlightClass};
use tarmac::config::SimulationConfig;
use tarmac::engine::{PhaseWork, ScheduledWork};
use tarmac::phase::{PhaseKind, ResourceClass};
use tarmac::runtime::Simulation;

// =============================================================================
// Test Helpers
// =============================================================================

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

/// Phase work whose bodies never finish on their own. Used to pin an
/// aircraft inside a phase while the monitor watches it.
struct StalledWork;

impl PhaseWork for StalledWork {
    fn perform(&self, _phase: PhaseKind) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(time::sleep(secs(100_000)))
    }

    fn turnaround(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(std::future::ready(()))
    }
}

/// Phase work that completes immediately.
fn instant_work() -> Arc<dyn PhaseWork> {
    Arc::new(ScheduledWork::new(
        Duration::ZERO,
        Duration::ZERO,
        Duration::ZERO,
        Duration::ZERO,
    ))
}

async fn status_of(sim: &Simulation, index: usize) -> AircraftStatus {
    sim.registry().snapshot().await[index].status()
}

// =============================================================================
// Integration Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_stalled_domestic_escalates_to_starvation() {
    let sim = Simulation::new(SimulationConfig::default(), Arc::new(StalledWork));
    sim.start().await;
    sim.admit(FlightClass::Domestic).await.unwrap();

    // The landing body stalls while holding runway + tower. The wait
    // clock started at phase entry, so the 60s sweep raises the alert.
    time::sleep(secs(62)).await;
    assert_eq!(status_of(&sim, 0).await, AircraftStatus::CriticalAlert);
    let stats = sim.stats();
    assert_eq!(stats.critical_alerts(), 1);
    assert_eq!(stats.aging_overrides(), 1);

    // The 90s sweep rules on the class: a Domestic starves, and that
    // counts as an accident.
    time::sleep(secs(30)).await;
    assert_eq!(status_of(&sim, 0).await, AircraftStatus::Starved);
    assert_eq!(stats.starved(), 1);
    assert_eq!(stats.accidents(), 1);
    assert_eq!(stats.deadlocked(), 0);

    // The monitor only reclassifies; the stalled worker keeps what it
    // holds until shutdown unwinds it.
    let pool = sim.pool();
    assert_eq!(pool.available(ResourceClass::Runway), 2);
    assert_eq!(pool.available(ResourceClass::TowerSlot), 1);

    let report = sim.finish().await;
    assert_eq!(report.totals.successes, 0);
    assert_eq!(report.totals.starved, 1);
    assert!(report.pool_restored());

    // The record carries its alert history and a terminal latency close
    // to the wait bound.
    let row = &report.aircraft[0];
    assert_eq!(row.alerts, 1);
    let total = row.total.unwrap().as_secs();
    assert!((90..=95).contains(&total), "total was {total}s");
}

#[tokio::test(start_paused = true)]
async fn test_stalled_international_is_written_off_as_deadlock() {
    let sim = Simulation::new(SimulationConfig::default(), Arc::new(StalledWork));
    sim.start().await;
    sim.admit(FlightClass::International).await.unwrap();

    time::sleep(secs(92)).await;
    assert_eq!(status_of(&sim, 0).await, AircraftStatus::Deadlocked);

    let stats = sim.stats();
    assert_eq!(stats.deadlocked(), 1);
    assert_eq!(stats.starved(), 0);
    assert_eq!(stats.accidents(), 0);
    // The alert fired on the way through the 60s band.
    assert_eq!(stats.critical_alerts(), 1);

    let report = sim.finish().await;
    assert_eq!(report.totals.deadlocked, 1);
    assert!(report.pool_restored());
}

#[tokio::test(start_paused = true)]
async fn test_wedged_acquisition_trips_the_stuck_scan() {
    // No runway can ever certify, and the reserve timeout is lifted past
    // the stuck limit so the aircraft sits inside the acquiring window
    // long enough for the scan to rule first.
    let config = SimulationConfig {
        runways: 0,
        reserve_timeout: secs(60),
        ..SimulationConfig::default()
    };
    let sim = Simulation::new(config, instant_work());
    sim.start().await;
    sim.admit(FlightClass::International).await.unwrap();

    time::sleep(secs(32)).await;
    assert_eq!(status_of(&sim, 0).await, AircraftStatus::Deadlocked);

    let stats = sim.stats();
    assert_eq!(stats.deadlocked(), 1);
    assert_eq!(stats.starved(), 0);
    // The scan fired long before the alert threshold.
    assert_eq!(stats.critical_alerts(), 0);

    // The woken worker unwinds through its failure ruling without ever
    // having held anything.
    let pool = sim.pool();
    assert_eq!(pool.available(ResourceClass::TowerSlot), 2);
    assert_eq!(pool.available(ResourceClass::Gate), 5);

    let report = sim.finish().await;
    assert_eq!(report.totals.deadlocked, 1);
    assert_eq!(report.totals.successes, 0);
}

#[tokio::test(start_paused = true)]
async fn test_domestic_alert_grants_override_and_unblocks() {
    let sim = Simulation::new(SimulationConfig::default(), instant_work());
    sim.start().await;

    // Constant International pressure, held by the test rather than a
    // real aircraft so it never drains.
    let arbiter = sim.arbiter();
    arbiter.enter_wait(FlightClass::International).await;

    let id = sim.admit(FlightClass::Domestic).await.unwrap();

    // Standing aside: no alert yet, nothing certified, nothing held.
    time::sleep(secs(58)).await;
    assert_eq!(status_of(&sim, 0).await, AircraftStatus::Pending);
    let stats = sim.stats();
    assert_eq!(stats.critical_alerts(), 0);
    assert_eq!(sim.pool().available(ResourceClass::Runway), 3);

    // The 60s sweep raises the alert and grants the permanent override;
    // the woken Domestic stops yielding and flies through.
    time::sleep(secs(12)).await;
    assert_eq!(stats.critical_alerts(), 1);
    assert_eq!(stats.aging_overrides(), 1);

    // Instant bodies leave only the 4s gate occupancy between the alert
    // and completion.
    time::sleep(secs(10)).await;
    assert_eq!(status_of(&sim, 0).await, AircraftStatus::Success);

    let registry = sim.registry();
    let records = registry.snapshot().await;
    let record = records.iter().find(|r| r.id() == id).unwrap();

    // The override outlives the alert, and the alert history survives
    // the successful finish.
    assert!(record.has_override());
    assert_eq!(record.alerts(), 1);

    // Landing certified right at the alert threshold.
    let landing = record.window(PhaseKind::Landing).duration().unwrap().as_secs();
    assert!((60..=62).contains(&landing), "landing took {landing}s");

    let report = sim.finish().await;
    assert_eq!(report.totals.successes, 1);
    assert_eq!(report.totals.starved, 0);
    assert_eq!(report.totals.critical_alerts, 1);
    assert_eq!(report.totals.aging_overrides, 1);
    assert!(report.pool_restored());
}
