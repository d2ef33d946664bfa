//! Simulation driver: arrival scheduling, jittered ground work, and the
//! operator-facing rendering of the final report.
//!
//! `main` parses flags into a [`SimulationRunner`]; the runner owns the
//! seeded RNG, paces admissions over the configured window (or until
//! Ctrl-C), and hands back the report for [`ReportTable`] to print.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::{self, Duration, Instant};
use tracing::{info, warn};

use tarmac::aircraft::FlightClass;
use tarmac::config::SimulationConfig;
use tarmac::engine::{PhaseWork, ScheduledWork};
use tarmac::error::AdmitError;
use tarmac::phase::{PhaseKind, ResourceClass};
use tarmac::report::SimulationReport;
use tarmac::runtime::Simulation;

// =============================================================================
// Ground Work
// =============================================================================

/// Scheduled phase bodies with a seeded random turnaround pause.
///
/// Landing, disembarkation, and takeoff run for their fixed scheduled
/// times; the taxi-and-boarding pause between disembarkation and takeoff
/// is drawn uniformly from 1-4 s. Runs with the same seed replay the same
/// ground traffic.
struct JitteredWork {
    schedule: ScheduledWork,
    rng: Mutex<StdRng>,
}

impl JitteredWork {
    fn seeded(seed: u64) -> Arc<dyn PhaseWork> {
        Arc::new(Self {
            schedule: ScheduledWork::default(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }
}

impl PhaseWork for JitteredWork {
    fn perform(&self, phase: PhaseKind) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.schedule.perform(phase)
    }

    fn turnaround(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let pause = Duration::from_millis(self.rng.lock().unwrap().random_range(1_000..4_000));
        Box::pin(time::sleep(pause))
    }
}

// =============================================================================
// Simulation Runner
// =============================================================================

/// Runner that drives one simulation from first arrival to final report.
pub struct SimulationRunner {
    sim: Simulation,
    rng: StdRng,
    international_ratio: f64,
}

impl SimulationRunner {
    /// Wires a simulation with jittered ground work. One root seed derives
    /// both the arrival pacing and the turnaround jitter.
    pub fn new(config: SimulationConfig, international_ratio: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let work = JitteredWork::seeded(rng.random());
        let sim = Simulation::new(config, work);
        Self {
            sim,
            rng,
            international_ratio,
        }
    }

    /// Admits aircraft at random intervals until the window closes or
    /// Ctrl-C arrives, then shuts the simulation down and returns the
    /// report.
    pub async fn run(mut self) -> SimulationReport {
        self.sim.start().await;

        let shutdown = self.sim.shutdown_token();
        tokio::spawn({
            let shutdown = shutdown.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupt received, shutting down");
                    shutdown.cancel();
                }
            }
        });

        let window_ends = Instant::now() + self.sim.config().sim_duration;
        loop {
            let delay = Duration::from_millis(self.rng.random_range(500..1_500));
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = time::sleep_until(window_ends) => break,
                _ = time::sleep(delay) => {}
            }

            let class = if self.rng.random_bool(self.international_ratio) {
                FlightClass::International
            } else {
                FlightClass::Domestic
            };
            match self.sim.admit(class).await {
                Ok(_) => {}
                Err(AdmitError::AtCapacity { limit }) => {
                    warn!(limit, "aircraft cap reached, no further arrivals");
                    break;
                }
                Err(AdmitError::ShuttingDown) => break,
            }
        }

        // Let in-flight aircraft use whatever remains of the window before
        // the shutdown cut. No-op when the window itself ended the loop.
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = time::sleep_until(window_ends) => {}
        }

        info!(
            elapsed_secs = self.sim.elapsed().as_secs(),
            "admission window closed"
        );
        self.sim.finish().await
    }
}

// =============================================================================
// Report Rendering
// =============================================================================

/// Operator-facing rendering of a [`SimulationReport`].
///
/// One row per aircraft in admission order, then the run totals and the
/// end-of-run availability of every resource class.
pub struct ReportTable<'a>(pub &'a SimulationReport);

impl fmt::Display for ReportTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;

        writeln!(
            f,
            "Final Report (elapsed: {})",
            format_duration(report.elapsed)
        )?;
        writeln!(f, "-----------------------------------------")?;
        writeln!(f)?;

        if !report.aircraft.is_empty() {
            writeln!(f, "Aircraft:")?;
            writeln!(
                f,
                "  {:<6} {:<5} {:<13} {:>6} {:>9} {:>10} {:>8} {:>8}",
                "ID", "Class", "Status", "Alerts", "Landing", "Disembark", "Takeoff", "Total",
            )?;
            for row in &report.aircraft {
                writeln!(
                    f,
                    "  {:<6} {:<5} {:<13} {:>6} {:>9} {:>10} {:>8} {:>8}",
                    row.id.to_string(),
                    row.class.code(),
                    row.status.to_string(),
                    row.alerts,
                    opt_duration(row.landing),
                    opt_duration(row.disembarkation),
                    opt_duration(row.takeoff),
                    opt_duration(row.total),
                )?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Totals:")?;
        writeln!(
            f,
            "  Admitted: {} ({} international, {} domestic)",
            report.admitted(),
            report.admitted_of(FlightClass::International),
            report.admitted_of(FlightClass::Domestic)
        )?;
        writeln!(
            f,
            "  Successes: {} ({:.1}%)",
            report.totals.successes,
            report.success_rate() * 100.0
        )?;
        writeln!(f, "  Failures: {}", report.totals.failures)?;
        writeln!(f, "  Critical alerts: {}", report.totals.critical_alerts)?;
        writeln!(f, "  Starved: {}", report.totals.starved)?;
        writeln!(f, "  Deadlocked: {}", report.totals.deadlocked)?;
        writeln!(f, "  Accidents: {}", report.totals.accidents)?;
        writeln!(f, "  Aging overrides: {}", report.totals.aging_overrides)?;
        if report.unresolved() > 0 {
            writeln!(f, "  Unresolved at shutdown: {}", report.unresolved())?;
        }
        writeln!(f)?;

        writeln!(f, "Resources:")?;
        for avail in &report.availability {
            writeln!(
                f,
                "  {}: {}/{} available",
                class_label(avail.class),
                avail.available,
                avail.capacity
            )?;
        }
        if !report.pool_restored() {
            writeln!(f, "  Warning: pool not fully restored")?;
        }

        Ok(())
    }
}

fn class_label(class: ResourceClass) -> &'static str {
    match class {
        ResourceClass::Runway => "Runways",
        ResourceClass::Gate => "Gates",
        ResourceClass::TowerSlot => "Tower slots",
    }
}

fn opt_duration(d: Option<Duration>) -> String {
    match d {
        Some(d) => format_duration(d),
        None => "-".to_string(),
    }
}

/// Format a duration as mm:ss, or hh:mm:ss past the hour mark.
fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}
