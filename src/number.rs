// src/number.rs

//! The numeric abstraction shared by every component of the simulation.
//! Works for floating point as well as fixed point types, so the same
//! controller can be exercised on a host and on a no-FPU target.

use crate::SimError;
use core::fmt::Debug;
use core::time::Duration;
use num_traits::{FromPrimitive, ToPrimitive};
use piddiy::Number as PiddiyNumber;

/// Custom trait to encapsulate base number requirements.
pub trait Number: PiddiyNumber + FromPrimitive + ToPrimitive + Debug {
    /// Clamps generic PartialOrd values within a given range.
    fn clamp(self, min: Self, max: Self) -> Self {
        if self < min {
            min
        } else if max < self {
            max
        } else {
            self
        }
    }

    /// Converts a configuration value, naming it in the error on failure.
    fn convert(name: &'static str, value: f64) -> Result<Self, SimError> {
        Self::from_f64(value).ok_or(SimError::Unrepresentable { name, value })
    }

    /// Converts a clock reading into seconds.
    fn seconds(name: &'static str, duration: Duration) -> Result<Self, SimError> {
        Self::convert(name, duration.as_secs_f64())
    }
}

impl<T: PiddiyNumber + FromPrimitive + ToPrimitive + Debug> Number for T {}
