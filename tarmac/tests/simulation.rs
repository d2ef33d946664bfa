//! Integration tests for the assembled simulation.
//!
//! These tests verify complete lifecycle flows through the public
//! `Simulation` API:
//! - Class priority serializing simultaneous arrivals under scarce capacity
//! - A Domestic deferring for an International's whole phase, not just
//!   its certification
//! - A zero-capacity class timing out every flight
//! - Per-phase release amounts exactly matching what was reserved
//! - Shutdown interrupting in-flight work and restoring the pool
//! - Mixed randomized traffic settling without fairness interventions
//!
//! Run with: `cargo test --test simulation`

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{self, Duration, Instant};

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

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Waits until every admitted aircraft has reached a terminal status.
async fn settle(sim: &Simulation, deadline: Duration) {
    let registry = sim.registry();
    let started = Instant::now();
    loop {
        let records = registry.snapshot().await;
        if !records.is_empty() && records.iter().all(|r| r.status().is_terminal()) {
            return;
        }
        if started.elapsed() >= deadline {
            panic!("aircraft did not settle within {deadline:?}");
        }
        time::sleep(millis(500)).await;
    }
}

/// Phase work with seeded random body and turnaround durations.
struct JitterWork {
    rng: Mutex<StdRng>,
}

impl JitterWork {
    fn seeded(seed: u64) -> Arc<dyn PhaseWork> {
        Arc::new(Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }

    fn jitter_ms(&self, range: std::ops::Range<u64>) -> u64 {
        self.rng.lock().unwrap().random_range(range)
    }
}

impl PhaseWork for JitterWork {
    fn perform(&self, _phase: PhaseKind) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let body = millis(self.jitter_ms(1_000..4_000));
        Box::pin(time::sleep(body))
    }

    fn turnaround(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let pause = millis(self.jitter_ms(500..2_000));
        Box::pin(time::sleep(pause))
    }
}

// =============================================================================
// Integration Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_simultaneous_arrivals_serialize_by_class_priority() {
    let config = SimulationConfig {
        runways: 1,
        gates: 1,
        tower_slots: 1,
        ..SimulationConfig::default()
    };
    let sim = Simulation::new(config, Arc::new(ScheduledWork::default()));
    sim.start().await;

    let international = sim.admit(FlightClass::International).await.unwrap();
    time::sleep(millis(100)).await;
    let domestic = sim.admit(FlightClass::Domestic).await.unwrap();

    settle(&sim, secs(60)).await;

    let registry = sim.registry();
    let records = registry.snapshot().await;
    let intl = records.iter().find(|r| r.id() == international).unwrap();
    let dom = records.iter().find(|r| r.id() == domestic).unwrap();

    assert_eq!(intl.status(), AircraftStatus::Success);
    assert_eq!(dom.status(), AircraftStatus::Success);

    // With one of everything, the Domestic cannot land until the
    // International's landing grant has come and gone.
    let intl_landed = intl.window(PhaseKind::Landing).finished().unwrap();
    let dom_landed = dom.window(PhaseKind::Landing).finished().unwrap();
    assert!(intl_landed < dom_landed);

    let report = sim.finish().await;
    assert_eq!(report.totals.successes, 2);
    assert_eq!(report.totals.critical_alerts, 0);
    assert!(report.pool_restored());
}

#[tokio::test(start_paused = true)]
async fn test_domestic_defers_while_international_holds_its_phase() {
    let work = Arc::new(ScheduledWork::new(secs(8), secs(5), secs(3), secs(2)));
    let sim = Simulation::new(SimulationConfig::default(), work);
    sim.start().await;

    let international = sim.admit(FlightClass::International).await.unwrap();
    time::sleep(millis(500)).await;
    let domestic = sim.admit(FlightClass::Domestic).await.unwrap();

    // Mid-landing-body the International still counts as contending, so
    // the Domestic has certified nothing even though capacity is free:
    // only the International's runway and tower slot are out.
    time::sleep(secs(4)).await; // t = 4.5
    let arbiter = sim.arbiter();
    assert_eq!(arbiter.contending(FlightClass::International).await, 1);
    assert_eq!(arbiter.contending(FlightClass::Domestic).await, 1);

    let pool = sim.pool();
    assert_eq!(pool.available(ResourceClass::Runway), 2);
    assert_eq!(pool.available(ResourceClass::TowerSlot), 1);
    assert_eq!(pool.available(ResourceClass::Gate), 5);

    let registry = sim.registry();
    let records = registry.snapshot().await;
    let dom = records.iter().find(|r| r.id() == domestic).unwrap();
    assert_eq!(dom.status(), AircraftStatus::Pending);
    assert!(dom.window(PhaseKind::Landing).finished().is_none());

    settle(&sim, secs(120)).await;

    let records = registry.snapshot().await;
    let intl = records.iter().find(|r| r.id() == international).unwrap();
    let dom = records.iter().find(|r| r.id() == domestic).unwrap();
    assert_eq!(intl.status(), AircraftStatus::Success);
    assert_eq!(dom.status(), AircraftStatus::Success);

    // The Domestic's own landing body is 8s and starts only after the
    // International's phase lets go, so it finishes a full body later.
    let intl_landed = intl.window(PhaseKind::Landing).finished().unwrap();
    let dom_landed = dom.window(PhaseKind::Landing).finished().unwrap();
    assert!(dom_landed >= intl_landed + secs(8));

    let report = sim.finish().await;
    assert_eq!(report.totals.successes, 2);
    assert_eq!(report.totals.critical_alerts, 0);
    assert!(report.pool_restored());
}

#[tokio::test(start_paused = true)]
async fn test_zero_runway_capacity_times_out_every_flight() {
    let config = SimulationConfig {
        runways: 0,
        ..SimulationConfig::default()
    };
    let sim = Simulation::new(config, Arc::new(ScheduledWork::default()));
    sim.start().await;

    for class in [
        FlightClass::International,
        FlightClass::Domestic,
        FlightClass::Domestic,
    ] {
        sim.admit(class).await.unwrap();
    }

    settle(&sim, secs(60)).await;
    let report = sim.finish().await;

    assert_eq!(report.totals.failures, 3);
    assert_eq!(report.totals.successes, 0);
    for row in &report.aircraft {
        assert_eq!(row.status, AircraftStatus::Failed);
    }
    assert!(report.pool_restored());
}

#[tokio::test(start_paused = true)]
async fn test_each_phase_credits_exactly_what_it_debited() {
    let sim = Simulation::new(SimulationConfig::default(), Arc::new(ScheduledWork::default()));
    let pool = sim.pool();
    sim.admit(FlightClass::International).await.unwrap();

    let free = |class| pool.available(class);

    // Landing body holds runway + tower over [0, 3).
    time::sleep(millis(1_500)).await;
    assert_eq!(free(ResourceClass::Runway), 2);
    assert_eq!(free(ResourceClass::TowerSlot), 1);
    assert_eq!(free(ResourceClass::Gate), 5);

    // Disembarkation body holds gate + tower over [3, 8); the landing
    // debits are already credited back in full.
    time::sleep(millis(3_500)).await; // t = 5
    assert_eq!(free(ResourceClass::Runway), 3);
    assert_eq!(free(ResourceClass::TowerSlot), 1);
    assert_eq!(free(ResourceClass::Gate), 4);

    // Occupancy holds the gate alone over [8, 12).
    time::sleep(millis(4_500)).await; // t = 9.5
    assert_eq!(free(ResourceClass::TowerSlot), 2);
    assert_eq!(free(ResourceClass::Gate), 4);
    assert_eq!(free(ResourceClass::Runway), 3);

    // Turnaround holds nothing over [12, 14).
    time::sleep(millis(3_500)).await; // t = 13
    for class in ResourceClass::ALL {
        assert_eq!(free(class), pool.capacity(class));
    }

    // Takeoff holds all three over [14, 17).
    time::sleep(millis(2_500)).await; // t = 15.5
    assert_eq!(free(ResourceClass::Runway), 2);
    assert_eq!(free(ResourceClass::Gate), 4);
    assert_eq!(free(ResourceClass::TowerSlot), 1);

    // Flight complete at t = 17; every debit has a matching credit.
    time::sleep(millis(2_500)).await; // t = 18
    let report = sim.finish().await;
    assert_eq!(report.totals.successes, 1);
    assert!(report.pool_restored());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_flights_and_restores_pool() {
    let work = Arc::new(ScheduledWork::new(secs(1_000), secs(5), secs(3), secs(2)));
    let sim = Simulation::new(SimulationConfig::default(), work);
    sim.start().await;
    sim.admit(FlightClass::International).await.unwrap();
    sim.admit(FlightClass::Domestic).await.unwrap();

    // Both are mid-landing-body when the run is cut off.
    time::sleep(secs(1)).await;
    let report = sim.finish().await;

    assert_eq!(report.admitted(), 2);
    assert_eq!(report.totals.successes, 0);
    assert_eq!(report.unresolved(), 2);
    assert!(report.pool_restored());
}

#[tokio::test(start_paused = true)]
async fn test_mixed_traffic_settles_without_fairness_interventions() {
    let sim = Simulation::new(SimulationConfig::default(), JitterWork::seeded(7));
    sim.start().await;

    let mut arrivals = StdRng::seed_from_u64(42);
    for n in 0..6 {
        let class = if n % 2 == 0 {
            FlightClass::International
        } else {
            FlightClass::Domestic
        };
        sim.admit(class).await.unwrap();
        time::sleep(millis(arrivals.random_range(500..1_500))).await;
    }

    settle(&sim, secs(150)).await;
    let report = sim.finish().await;

    assert_eq!(report.totals.successes, 6);
    assert_eq!(report.totals.failures, 0);
    assert_eq!(report.totals.starved, 0);
    assert_eq!(report.totals.deadlocked, 0);
    assert_eq!(report.totals.critical_alerts, 0);
    assert_eq!(report.totals.aging_overrides, 0);
    assert!(report.pool_restored());
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Mixed classes and random timing never produce a cyclic wait: the
    /// monitor's stuck-acquisition scan stays silent and nobody starves
    /// as long as every capacity is at least one.
    #[test]
    fn prop_mixed_traffic_is_deadlock_free(
        seed in any::<u64>(),
        classes in proptest::collection::vec(any::<bool>(), 2..7),
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        rt.block_on(async {
            let sim = Simulation::new(SimulationConfig::default(), JitterWork::seeded(seed));
            sim.start().await;

            let mut arrivals = StdRng::seed_from_u64(seed ^ 0x5bd1_e995);
            let expected = classes.len() as u64;
            for international in classes {
                let class = if international {
                    FlightClass::International
                } else {
                    FlightClass::Domestic
                };
                sim.admit(class).await.unwrap();
                time::sleep(millis(arrivals.random_range(500..1_500))).await;
            }

            settle(&sim, secs(150)).await;
            let report = sim.finish().await;

            assert_eq!(report.totals.successes, expected);
            assert_eq!(report.totals.starved, 0);
            assert_eq!(report.totals.deadlocked, 0);
            assert!(report.pool_restored());
        });
    }
}
