// src/plant.rs

//! # Bar Plant Model
//!
//! A single rotational degree of freedom. Angular velocity is changed only
//! by discrete increments (disturbances and control effort) and the angle
//! is advanced by explicit Euler integration once per simulation tick.

use crate::Number;

/// Angular position and velocity of the bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantState<T> {
    /// Angle in degrees.
    pub angle: T,
    /// Angular velocity in degrees per second.
    pub angular_velocity: T,
}

/// The simulated bar.
#[derive(Debug, Clone)]
pub struct PlantModel<T> {
    state: PlantState<T>,
}

impl<T: Number> PlantModel<T> {
    /// Creates a plant at the given angle and angular velocity.
    pub fn new(angle: T, angular_velocity: T) -> Self {
        PlantModel {
            state: PlantState {
                angle,
                angular_velocity,
            },
        }
    }

    /// Adds `delta` to the angular velocity.
    pub fn apply_angular_velocity_delta(&mut self, delta: T) {
        self.state.angular_velocity = self.state.angular_velocity + delta;
    }

    /// Advances the angle by `angular_velocity * dt`.
    ///
    /// `dt` must not be negative.
    pub fn integrate(&mut self, dt: T) {
        debug_assert!(T::zero() <= dt, "plant integrated over a negative time step");
        self.state.angle = self.state.angle + self.state.angular_velocity * dt;
    }

    /// Current angle in degrees.
    pub fn angle(&self) -> T {
        self.state.angle
    }

    /// Current angular velocity in degrees per second.
    pub fn angular_velocity(&self) -> T {
        self.state.angular_velocity
    }

    /// Copy of the full state.
    pub fn state(&self) -> PlantState<T> {
        self.state
    }
}
