//! Simulation wiring and lifecycle.
//!
//! `Simulation` owns every shared component and ties their lifetimes
//! together: construct it, `start` the monitor, `admit` aircraft as they
//! arrive, then `finish` to shut down and collect the report. Each
//! admitted aircraft gets a dedicated worker task in a `JoinSet` so
//! shutdown can join them all before the report is read.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::aircraft::{AircraftId, AircraftRegistry, FlightClass};
use crate::arbiter::PriorityArbiter;
use crate::config::SimulationConfig;
use crate::engine::{FlightWorker, PhaseWork};
use crate::error::AdmitError;
use crate::monitor::StarvationMonitor;
use crate::pool::ResourcePool;
use crate::report::SimulationReport;
use crate::stats::SimStats;

/// A fully wired airport simulation.
pub struct Simulation {
    config: SimulationConfig,
    registry: Arc<AircraftRegistry>,
    arbiter: Arc<PriorityArbiter>,
    stats: Arc<SimStats>,
    pool: Arc<ResourcePool>,
    work: Arc<dyn PhaseWork>,
    shutdown: CancellationToken,
    workers: Mutex<JoinSet<()>>,
    monitor: Mutex<Option<JoinHandle<()>>>,
    started_at: Instant,
}

impl Simulation {
    /// Wires the shared components. Nothing runs until [`start`] and
    /// [`admit`] are called.
    ///
    /// [`start`]: Simulation::start
    /// [`admit`]: Simulation::admit
    pub fn new(config: SimulationConfig, work: Arc<dyn PhaseWork>) -> Self {
        let registry = Arc::new(AircraftRegistry::new());
        let arbiter = Arc::new(PriorityArbiter::new());
        let stats = Arc::new(SimStats::new());
        let shutdown = CancellationToken::new();
        let pool = Arc::new(ResourcePool::new(
            &config,
            Arc::clone(&registry),
            Arc::clone(&arbiter),
            shutdown.clone(),
        ));
        Self {
            config,
            registry,
            arbiter,
            stats,
            pool,
            work,
            shutdown,
            workers: Mutex::new(JoinSet::new()),
            monitor: Mutex::new(None),
            started_at: Instant::now(),
        }
    }

    /// Spawns the starvation monitor. Idempotent; a second call is a
    /// no-op.
    pub async fn start(&self) {
        let mut slot = self.monitor.lock().await;
        if slot.is_some() {
            return;
        }
        let monitor = StarvationMonitor::new(
            &self.config,
            Arc::clone(&self.registry),
            Arc::clone(&self.pool),
            Arc::clone(&self.arbiter),
            Arc::clone(&self.stats),
        );
        *slot = Some(tokio::spawn(monitor.run(self.shutdown.clone())));
        info!(
            runways = self.config.runways,
            gates = self.config.gates,
            tower_slots = self.config.tower_slots,
            max_aircraft = self.config.max_aircraft,
            "simulation started"
        );
    }

    /// Admits one aircraft and spawns its lifecycle worker.
    pub async fn admit(&self, class: FlightClass) -> Result<AircraftId, AdmitError> {
        if self.shutdown.is_cancelled() {
            return Err(AdmitError::ShuttingDown);
        }
        let id = self
            .registry
            .admit(class, self.config.max_aircraft)
            .await
            .ok_or(AdmitError::AtCapacity {
                limit: self.config.max_aircraft,
            })?;

        let worker = FlightWorker::new(
            self.config.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.pool),
            Arc::clone(&self.arbiter),
            Arc::clone(&self.stats),
            Arc::clone(&self.work),
            self.shutdown.clone(),
        );
        self.workers.lock().await.spawn(worker.run(id));

        info!(aircraft = %id, class = %class, "aircraft admitted");
        Ok(id)
    }

    /// Signals shutdown, joins every task, and collects the report.
    ///
    /// Ordering matters: the cancellation flag flips first, then the
    /// semaphores close and all parked waiters are woken, so every worker
    /// observes shutdown at its next checkpoint and unwinds. The report
    /// is collected only after the last join.
    pub async fn finish(self) -> SimulationReport {
        info!("simulation shutting down");
        self.shutdown.cancel();
        self.pool.close();
        self.arbiter.wake_all();

        let mut workers = self.workers.into_inner();
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "flight worker panicked");
            }
        }
        if let Some(monitor) = self.monitor.into_inner() {
            if let Err(err) = monitor.await {
                error!(error = %err, "monitor task panicked");
            }
        }

        let elapsed = self.started_at.elapsed();
        let report =
            SimulationReport::collect(&self.registry, &self.pool, &self.stats, elapsed).await;
        info!(
            elapsed_secs = elapsed.as_secs(),
            admitted = report.admitted(),
            successes = report.totals.successes,
            failures = report.totals.failures,
            starved = report.totals.starved,
            deadlocked = report.totals.deadlocked,
            "simulation finished"
        );
        report
    }

    /// Token observed by every long-running task. Cloning it lets a
    /// driver tie external signals (Ctrl-C) to simulation shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn registry(&self) -> Arc<AircraftRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn pool(&self) -> Arc<ResourcePool> {
        Arc::clone(&self.pool)
    }

    pub fn arbiter(&self) -> Arc<PriorityArbiter> {
        Arc::clone(&self.arbiter)
    }

    pub fn stats(&self) -> Arc<SimStats> {
        Arc::clone(&self.stats)
    }

    /// Wall time since construction.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScheduledWork;

    fn instant_work() -> Arc<dyn PhaseWork> {
        Arc::new(ScheduledWork::new(
            Duration::ZERO,
            Duration::ZERO,
            Duration::ZERO,
            Duration::ZERO,
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_admit_respects_aircraft_cap() {
        let config = SimulationConfig {
            max_aircraft: 2,
            ..SimulationConfig::default()
        };
        let sim = Simulation::new(config, instant_work());

        assert!(sim.admit(FlightClass::Domestic).await.is_ok());
        assert!(sim.admit(FlightClass::International).await.is_ok());
        assert_eq!(
            sim.admit(FlightClass::Domestic).await,
            Err(AdmitError::AtCapacity { limit: 2 })
        );
        sim.finish().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_admit_refused_after_shutdown_signal() {
        let sim = Simulation::new(SimulationConfig::default(), instant_work());
        sim.shutdown_token().cancel();

        assert_eq!(
            sim.admit(FlightClass::Domestic).await,
            Err(AdmitError::ShuttingDown)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_joins_workers_and_reports() {
        let sim = Simulation::new(SimulationConfig::default(), instant_work());
        sim.start().await;
        sim.admit(FlightClass::International).await.unwrap();
        sim.admit(FlightClass::Domestic).await.unwrap();

        // Zero-length phase bodies still spend the 4s gate occupancy.
        tokio::time::sleep(Duration::from_secs(10)).await;

        let report = sim.finish().await;
        assert_eq!(report.admitted(), 2);
        assert_eq!(report.totals.successes, 2);
        assert_eq!(report.unresolved(), 0);
        assert!(report.pool_restored());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_spawns_one_monitor() {
        let sim = Simulation::new(SimulationConfig::default(), instant_work());
        sim.start().await;
        sim.start().await;
        sim.finish().await;
    }
}
