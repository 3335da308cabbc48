// src/config.rs

//! Configuration for a simulation run.
//!
//! Values are plain `f64` and [`Duration`] fields so a configuration can be
//! written once and used with any number type. They are converted when the
//! simulation is built, which is also when they are validated.

use crate::SimError;
use std::time::Duration;

/// Configuration for the bar, controller, disturbances and cadences.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Period of the physical integration cadence.
    pub simulation_period: Duration,
    /// Period of the controller cadence.
    pub control_period: Duration,
    /// Period of the display cadence.
    pub display_period: Duration,
    /// Initial bar angle in degrees.
    pub initial_angle: f64,
    /// Initial angular velocity in degrees per second.
    pub initial_angular_velocity: f64,
    /// Magnitude limit of the PID integral term.
    pub integral_limit: f64,
    /// Factor applied to the PID output before saturation.
    pub effort_scale: f64,
    /// Actuator saturation, applied symmetrically to the scaled effort.
    pub effort_limit: f64,
    /// Half-width of the uniform measurement noise in degrees.
    pub noise_amplitude: f64,
    /// Seed for the measurement noise. `None` seeds from the OS.
    pub noise_seed: Option<u64>,
    /// Velocity increment applied on every simulation tick.
    pub constant_disturbance: f64,
    /// Velocity increment of the periodic impulse.
    pub impulse_disturbance: f64,
    /// Time between impulses.
    pub impulse_interval: Duration,
    /// Target angles, visited in order.
    pub setpoints: Vec<f64>,
    /// Index of the first target.
    pub setpoint_start_index: usize,
    /// Time between setpoint changes.
    pub setpoint_interval: Duration,
    /// Length of the history window in seconds.
    pub history_window: f64,
    /// Gains used until a gain source says otherwise, as `(p, i, d)`.
    pub initial_gains: (f64, f64, f64),
}

impl SimulationConfig {
    /// Creates a configuration with the default tuning.
    ///
    /// The bar starts at 90 degrees with the setpoint cycling through
    /// -30, 0 and 30 degrees every two seconds.
    ///
    /// Example Usage
    /// ```
    /// use bar_stabilization_sim::SimulationConfig;
    /// use std::time::Duration;
    ///
    /// let mut config = SimulationConfig::new();
    ///
    /// // Hold a single level target and disable the shocks.
    /// config.setpoints = vec![0.0];
    /// config.setpoint_start_index = 0;
    /// config.impulse_disturbance = 0.0;
    ///
    /// // Reproducible measurement noise.
    /// config.noise_seed = Some(7);
    ///
    /// // Run the controller at 50 Hz.
    /// config.control_period = Duration::from_millis(20);
    ///
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new() -> Self {
        Self {
            simulation_period: Duration::from_millis(10),
            control_period: Duration::from_secs_f64(1.0 / 30.0),
            display_period: Duration::from_secs_f64(1.0 / 60.0),
            initial_angle: 90.0,
            initial_angular_velocity: 0.0,
            integral_limit: 8.0,
            effort_scale: 1.5,
            effort_limit: 120.0,
            noise_amplitude: 0.1,
            noise_seed: None,
            constant_disturbance: 8.0,
            impulse_disturbance: 200.0,
            impulse_interval: Duration::from_secs(8),
            setpoints: vec![-30.0, 0.0, 30.0],
            setpoint_start_index: 1,
            setpoint_interval: Duration::from_secs(2),
            history_window: 5.0,
            initial_gains: (1.0, 0.0, 0.05),
        }
    }

    /// Checks every precondition the simulation relies on.
    pub fn validate(&self) -> Result<(), SimError> {
        SimError::check_period("simulation", self.simulation_period)?;
        SimError::check_period("control", self.control_period)?;
        SimError::check_period("display", self.display_period)?;
        SimError::check_period("impulse", self.impulse_interval)?;
        SimError::check_period("setpoint", self.setpoint_interval)?;

        non_negative("integral limit", self.integral_limit)?;
        non_negative("effort limit", self.effort_limit)?;
        non_negative("noise amplitude", self.noise_amplitude)?;
        non_negative("history window", self.history_window)?;
        finite("effort scale", self.effort_scale)?;
        finite("initial angle", self.initial_angle)?;
        finite("initial angular velocity", self.initial_angular_velocity)?;
        finite("constant disturbance", self.constant_disturbance)?;
        finite("impulse disturbance", self.impulse_disturbance)?;
        for &value in &self.setpoints {
            finite("setpoint", value)?;
        }

        if self.setpoints.is_empty() {
            return Err(SimError::EmptySetpoints);
        }
        if self.setpoint_start_index >= self.setpoints.len() {
            return Err(SimError::SetpointIndexOutOfRange {
                index: self.setpoint_start_index,
                len: self.setpoints.len(),
            });
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), SimError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidParameter { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), SimError> {
    finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that the default configuration is valid.
    #[test]
    fn test_config_default_valid() {
        let config = SimulationConfig::default();
        assert_eq!(Ok(()), config.validate());
        assert_eq!(Duration::from_millis(10), config.simulation_period);
        assert_eq!(1, config.setpoint_start_index);
    }

    /// Test that zero periods are refused by name.
    #[test]
    fn test_config_zero_period() {
        let mut config = SimulationConfig::new();
        config.display_period = Duration::ZERO;
        assert_eq!(
            Err(SimError::ZeroPeriod { name: "display" }),
            config.validate()
        );
    }

    /// Test that negative limits are refused.
    #[test]
    fn test_config_negative_limits() {
        let mut config = SimulationConfig::new();
        config.effort_limit = -1.0;
        assert_eq!(
            Err(SimError::InvalidParameter {
                name: "effort limit",
                value: -1.0
            }),
            config.validate()
        );

        let mut config = SimulationConfig::new();
        config.noise_amplitude = f64::NAN;
        assert!(config.validate().is_err());
    }

    /// Test that infinite and NaN values are refused before they reach the loop.
    #[test]
    fn test_config_non_finite() {
        let cases: [(&str, fn(&mut SimulationConfig)); 6] = [
            ("history window", |c| c.history_window = f64::INFINITY),
            ("noise amplitude", |c| c.noise_amplitude = f64::INFINITY),
            ("integral limit", |c| c.integral_limit = f64::INFINITY),
            ("effort limit", |c| c.effort_limit = f64::INFINITY),
            ("effort scale", |c| c.effort_scale = f64::INFINITY),
            ("impulse disturbance", |c| c.impulse_disturbance = f64::NEG_INFINITY),
        ];
        for (name, edit) in cases {
            let mut config = SimulationConfig::new();
            edit(&mut config);
            match config.validate() {
                Err(SimError::InvalidParameter { name: rejected, .. }) => {
                    assert_eq!(name, rejected)
                }
                other => panic!("{name} should be rejected, got {other:?}"),
            }
        }

        let mut config = SimulationConfig::new();
        config.effort_scale = f64::NAN;
        assert!(config.validate().is_err());
    }

    /// Test the setpoint list preconditions.
    #[test]
    fn test_config_setpoints() {
        let mut config = SimulationConfig::new();
        config.setpoints.clear();
        assert_eq!(Err(SimError::EmptySetpoints), config.validate());

        let mut config = SimulationConfig::new();
        config.setpoint_start_index = 5;
        assert_eq!(
            Err(SimError::SetpointIndexOutOfRange { index: 5, len: 3 }),
            config.validate()
        );
    }
}
