// src/lib.rs

//! # Drone Bar Stabilization Simulator
//!
//! This crate simulates a bar with a single rotational degree of freedom,
//! held level by a PID controller while a steady torque bias and periodic
//! shocks push it off target. Physical integration, control and display run
//! on three independent cadences driven by a single cooperative loop, and a
//! rolling window of angle and setpoint samples is kept for plotting.
//!
//! Rendering and gain tuning are left to the host program. It supplies gains
//! through a [`GainSource`] and receives a [`Frame`] on every display tick.
//!
//! ```
//! use bar_stabilization_sim::{Gains, ManualClock, Simulation, SimulationConfig};
//! use bar_stabilization_sim::clock::Clock;
//! use std::time::Duration;
//!
//! let mut config = SimulationConfig::new();
//! config.noise_seed = Some(1);
//! let mut sim = Simulation::<f32>::with_config(&config).unwrap();
//!
//! let clock = ManualClock::new();
//! let gains = Gains::new(2.0, 0.5, 0.1);
//! for _ in 0..1000 {
//!     clock.advance(Duration::from_millis(1));
//!     sim.poll(clock.now(), &gains).unwrap();
//! }
//! assert_eq!(100, sim.history().len());
//! ```

#![deny(missing_docs)]

pub mod clock;
pub mod config;
pub mod controller;
pub mod disturbance;
pub mod error;
pub mod history;
pub mod logger;
pub mod number;
pub mod pid;
pub mod plant;
pub mod setpoint;
pub mod shared;
pub mod simulation;

#[doc(inline)]
pub use clock::{ManualClock, MonotonicClock, Scheduler};
#[doc(inline)]
pub use config::SimulationConfig;
#[doc(inline)]
pub use controller::{AngleController, GainLimits, GainRange, Gains, PidState};
#[doc(inline)]
pub use error::SimError;
#[doc(inline)]
pub use history::{HistoryBuffer, HistorySample, HistorySnapshot};
#[doc(inline)]
pub use number::Number;
#[doc(inline)]
pub use plant::{PlantModel, PlantState};
#[doc(inline)]
pub use shared::{SharedFrame, SharedGains};
#[doc(inline)]
pub use simulation::{Frame, FrameSink, GainSource, PollReport, Simulation};

#[cfg(test)]
mod test_utils;
