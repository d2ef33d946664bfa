//! Error types for the reservation core.

use thiserror::Error;

/// Failure modes of a reservation or acquisition attempt.
///
/// Callers need to distinguish "retry might help" from "retry is pointless":
/// a [`Timeout`](ReserveError::Timeout) leaves the aircraft alive (the phase
/// fails, the record is marked `Failed` by the caller), while the other two
/// mean the worker must unwind without further resource demands.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReserveError {
    /// The reservation or acquisition wait exceeded its bound.
    #[error("reservation timed out")]
    Timeout,

    /// Shutdown was signalled while waiting.
    #[error("simulation has ended")]
    SimulationEnded,

    /// The aircraft was independently reclassified as failed (typically by
    /// the monitor) while this operation was in flight.
    #[error("aircraft already failed")]
    AircraftFailed,
}

/// Errors returned when admitting a new aircraft into the simulation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmitError {
    /// Shutdown has been signalled; no new aircraft are accepted.
    #[error("simulation is shutting down")]
    ShuttingDown,

    /// The configured aircraft cap has been reached.
    #[error("aircraft limit reached ({limit})")]
    AtCapacity {
        /// The configured admission cap.
        limit: usize,
    },
}
