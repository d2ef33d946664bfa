//! Tarmac - airport ground-resource reservation and fairness core
//!
//! This library simulates aircraft contending for a fixed pool of airport
//! resources (runways, gates, tower slots). Each aircraft runs a
//! three-phase lifecycle (landing, disembarkation, takeoff) whose resource
//! needs are certified atomically before anything is physically acquired,
//! while a priority arbiter favors International traffic and an aging
//! override keeps Domestic traffic from starving. An independent monitor
//! escalates long waits to critical alerts and declares starvation or
//! deadlock when bounds are exceeded.
//!
//! # High-Level API
//!
//! The [`runtime`] module provides the assembled simulation:
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use tarmac::aircraft::FlightClass;
//! use tarmac::config::SimulationConfig;
//! use tarmac::engine::ScheduledWork;
//! use tarmac::runtime::Simulation;
//!
//! let sim = Simulation::new(SimulationConfig::default(), Arc::new(ScheduledWork::default()));
//! sim.start().await;
//!
//! // Admit aircraft as they arrive
//! sim.admit(FlightClass::International).await?;
//! sim.admit(FlightClass::Domestic).await?;
//!
//! // Shut down and collect the end-of-run report
//! let report = sim.finish().await;
//! println!("completed: {}", report.totals.successes);
//! ```

pub mod aircraft;
pub mod arbiter;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod phase;
pub mod pool;
pub mod report;
pub mod runtime;
pub mod stats;

/// Version of the tarmac library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
