// src/pid/angle.rs

//! # Angle PID Control Module
//!
//! This module provides a compute function and control data structure
//! to perform angle PID calculations with a clamped integrator. The
//! derivative is taken on the error, so a setpoint step shows up as a
//! derivative kick on the next sample.

use crate::Number;
use piddiy::PidController;

/// Control data for the angle PID compute callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AngleControlData<T> {
    /// The measured angle, including any sensor noise.
    pub measurement: T,
    /// The time delta since the previous control sample. Must be positive.
    pub dt: T,
    /// The maximum magnitude of the integral term, used to prevent integral windup.
    pub integral_limit: T,
}

/// Angle PID compute callback.
///
/// Returns the `(error, integral, derivative)` triple. The controller keeps
/// the returned error and integral as its state for the next sample.
pub fn compute_angle<T: Number>(
    pid: &mut PidController<T, AngleControlData<T>>,
    data: AngleControlData<T>,
) -> (T, T, T) {
    let error = pid.set_point - data.measurement;
    let integral =
        (pid.integral + error * data.dt).clamp(-data.integral_limit, data.integral_limit);
    let derivative = (error - pid.error) / data.dt;

    (error, integral, derivative)
}
