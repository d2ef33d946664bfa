//! The flight engine: per-aircraft workers and the work they perform.
//!
//! ```text
//! admit ──▶ FlightWorker ──▶ landing ──▶ disembarkation ──▶ takeoff
//!                │               │              │               │
//!                │           stand aside ─▶ certify ─▶ acquire ─▶ perform ─▶ release
//!                ▼
//!          PhaseWork (pluggable phase bodies and turnaround)
//! ```
//!
//! Workers talk to the pool for resources, the arbiter for class priority,
//! and the registry for status; the monitor never runs worker code, it
//! only flips flags the workers observe at their checkpoints.

mod work;
mod worker;

// Work providers
pub use work::{
    PhaseWork, ScheduledWork, DEFAULT_DISEMBARK_SECS, DEFAULT_LANDING_SECS,
    DEFAULT_TAKEOFF_SECS, DEFAULT_TURNAROUND_SECS,
};

// Flight protocol
pub use worker::FlightWorker;
