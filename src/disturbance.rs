// src/disturbance.rs

//! # Disturbance Injection
//!
//! Two perturbations of the bar's angular velocity, both applied once per
//! simulation tick: a constant increment modelling a steady torque bias, and
//! a large impulse modelling an abrupt external shock that repeats on a
//! fixed wall-clock interval.

use crate::plant::PlantModel;
use crate::{Number, SimError};
use log::debug;
use std::time::Duration;

/// Applies steady and periodic velocity disturbances to the plant.
#[derive(Debug, Clone)]
pub struct DisturbanceInjector<T> {
    constant: T,
    impulse: T,
    impulse_interval: Duration,
    last_impulse: Duration,
}

impl<T: Number> DisturbanceInjector<T> {
    /// Creates an injector whose impulse clock starts at `start`.
    pub fn new(
        constant: T,
        impulse: T,
        impulse_interval: Duration,
        start: Duration,
    ) -> Result<Self, SimError> {
        SimError::check_period("impulse", impulse_interval)?;
        Ok(DisturbanceInjector {
            constant,
            impulse,
            impulse_interval,
            last_impulse: start,
        })
    }

    /// Applies this tick's disturbances.
    ///
    /// The impulse fires once strictly more than one interval has passed
    /// since the previous impulse. Returns whether it fired.
    pub fn apply(&mut self, plant: &mut PlantModel<T>, now: Duration) -> bool {
        let fired = now.saturating_sub(self.last_impulse) > self.impulse_interval;
        if fired {
            plant.apply_angular_velocity_delta(self.impulse);
            self.last_impulse = now;
            debug!("impulse disturbance of {:?} deg/s at {:?}", self.impulse, now);
        }
        plant.apply_angular_velocity_delta(self.constant);
        fired
    }

    /// When the last impulse fired.
    pub fn last_impulse(&self) -> Duration {
        self.last_impulse
    }
}
