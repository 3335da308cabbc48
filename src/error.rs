// src/error.rs

//! # Simulation Errors
//!
//! Every fallible operation in this crate reports a [`SimError`]. The
//! simulation is pure arithmetic, so the only failures are precondition
//! violations detected at construction time or at call time.

use std::time::Duration;
use thiserror::Error;

/// Precondition violations surfaced by the control core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A derivative was requested over a time step that is zero or negative.
    #[error("time step must be positive")]
    NonPositiveTimeStep,
    /// A setpoint sequencer was built without any target values.
    #[error("setpoint list is empty")]
    EmptySetpoints,
    /// The starting setpoint index does not address the setpoint list.
    #[error("setpoint index {index} is out of range for {len} values")]
    SetpointIndexOutOfRange {
        /// The rejected index.
        index: usize,
        /// Number of configured setpoints.
        len: usize,
    },
    /// A cadence or interval was configured with a zero period.
    #[error("{name} period must be non-zero")]
    ZeroPeriod {
        /// Name of the offending cadence.
        name: &'static str,
    },
    /// A configuration value is outside its admissible range.
    #[error("invalid {name}: {value}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A value cannot be represented in the simulation's number type.
    #[error("{name} value {value} is not representable")]
    Unrepresentable {
        /// Name of the value being converted.
        name: &'static str,
        /// The value that failed to convert.
        value: f64,
    },
}

impl SimError {
    /// Rejects a zero `period` for the cadence called `name`.
    pub(crate) fn check_period(name: &'static str, period: Duration) -> Result<(), SimError> {
        if period.is_zero() {
            Err(SimError::ZeroPeriod { name })
        } else {
            Ok(())
        }
    }
}
