//! Aircraft records and their lifecycle.
//!
//! An aircraft enters here when admitted, carries a status driven by the
//! transition table in [`status`], and accumulates phase timings until it
//! reaches a terminal state. The [`registry`] is the single shared store
//! both workers and the monitor go through.

mod record;
mod registry;
mod status;

// Identity and records
pub use record::{Aircraft, AircraftId, FlightClass, PhaseWindow};

// Shared store
pub use registry::{AircraftRegistry, Probe};

// Status machine
pub use status::{transition, AircraftStatus, StatusChange, StatusEvent};
