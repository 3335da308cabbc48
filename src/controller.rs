// src/controller.rs

//! # Bar Angle Controller
//!
//! Wraps a [`piddiy::PidController`] driven by [`compute_angle`] and owns the
//! PID state (integral accumulator and previous error) for the simulated bar.
//!
//! Gains are not stored between samples. Every call to
//! [`AngleController::compute`] receives the gain snapshot taken at the top of
//! the latest simulation tick, so a collaborator may move the gains at any
//! time without resetting the controller.
//!
//! Actuator saturation is deliberately left to the caller. The controller
//! only guarantees that its integral term stays within
//! `[-integral_limit, integral_limit]`.

use crate::pid::{compute_angle, AngleControlData};
use crate::{Number, SimError};
use piddiy::PidController;

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gains<T> {
    /// Proportional gain.
    pub p: T,
    /// Integral gain.
    pub i: T,
    /// Derivative gain.
    pub d: T,
}

impl<T: Number> Gains<T> {
    /// Creates a gain triple.
    pub fn new(p: T, i: T, d: T) -> Self {
        Self { p, i, d }
    }
}

/// Inclusive range a single gain may be tuned within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainRange<T> {
    /// Lower bound.
    pub min: T,
    /// Upper bound.
    pub max: T,
}

/// Tuning ranges for all three gains.
///
/// The controller accepts any gains it is given. These ranges belong to the
/// collaborator that produces gains, which is expected to clamp before
/// handing them over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainLimits<T> {
    /// Range of the proportional gain.
    pub p: GainRange<T>,
    /// Range of the integral gain.
    pub i: GainRange<T>,
    /// Range of the derivative gain.
    pub d: GainRange<T>,
}

impl<T: Number> GainLimits<T> {
    /// The tuning sliders' ranges: p from 0 to 60, i from 0 to 50 and
    /// d from 0 to 5.
    pub fn sliders() -> Result<Self, SimError> {
        let range = |name: &'static str, max: f64| -> Result<GainRange<T>, SimError> {
            Ok(GainRange {
                min: T::zero(),
                max: T::convert(name, max)?,
            })
        };
        Ok(GainLimits {
            p: range("p gain limit", 60.0)?,
            i: range("i gain limit", 50.0)?,
            d: range("d gain limit", 5.0)?,
        })
    }

    /// Clamps each gain into its range.
    pub fn clamp(&self, gains: Gains<T>) -> Gains<T> {
        Gains {
            p: gains.p.clamp(self.p.min, self.p.max),
            i: gains.i.clamp(self.i.min, self.i.max),
            d: gains.d.clamp(self.d.min, self.d.max),
        }
    }
}

/// Read-only copy of the controller's persistent state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidState<T> {
    /// Accumulated, clamped integral of the error.
    pub integral: T,
    /// Error observed on the previous sample.
    pub previous_error: T,
}

/// Angle PID controller with a clamped integrator.
pub struct AngleController<T: Number> {
    pid: PidController<T, AngleControlData<T>>,
    integral_limit: T,
}

impl<T: Number> AngleController<T> {
    /// Creates a controller with zeroed state.
    ///
    /// A negative `integral_limit` is rejected.
    pub fn new(integral_limit: T) -> Result<Self, SimError> {
        if integral_limit < T::zero() {
            return Err(SimError::InvalidParameter {
                name: "integral limit",
                value: integral_limit.to_f64().unwrap_or(f64::NAN),
            });
        }
        let mut pid = PidController::new();
        pid.compute_fn(compute_angle);
        Ok(AngleController {
            pid,
            integral_limit,
        })
    }

    /// Computes the control effort for one control sample.
    ///
    /// Mutates the integral and previous error, so repeating a call with the
    /// same arguments models a second measurement and yields a different
    /// result. `dt` must be positive; nothing is mutated otherwise.
    pub fn compute(
        &mut self,
        gains: Gains<T>,
        target: T,
        measured: T,
        dt: T,
    ) -> Result<T, SimError> {
        if dt <= T::zero() {
            return Err(SimError::NonPositiveTimeStep);
        }
        self.pid
            .set_point(target)
            .kp(gains.p)
            .ki(gains.i)
            .kd(gains.d);
        let data = AngleControlData {
            measurement: measured,
            dt,
            integral_limit: self.integral_limit,
        };
        Ok(self.pid.compute(data))
    }

    /// Returns the current integral and previous error.
    pub fn state(&self) -> PidState<T> {
        PidState {
            integral: self.pid.integral,
            previous_error: self.pid.error,
        }
    }

    /// Returns the integral limit.
    pub fn integral_limit(&self) -> T {
        self.integral_limit
    }

    /// Zeroes the integral and previous error.
    pub fn reset(&mut self) {
        self.pid.integral = T::zero();
        self.pid.error = T::zero();
    }
}
