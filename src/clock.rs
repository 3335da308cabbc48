// src/clock.rs

//! # Clock and Multi-Rate Scheduler
//!
//! The simulation is driven by repeatedly polling a non-blocking clock. Each
//! cadence remembers when it last fired and fires again once at least one
//! period has elapsed. When it fires, the cadence reports the elapsed time it
//! actually observed and restarts from the observed fire time rather than
//! from the nominal schedule, so a slow poll never triggers a burst of
//! catch-up ticks. The cost is that a cadence guarantees a minimum period
//! only, and sample spacing follows the polling jitter.

use crate::SimError;
use std::cell::Cell;
use std::time::{Duration, Instant};

/// A non-blocking source of elapsed time.
pub trait Clock {
    /// Time elapsed since the clock's epoch.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`], with its epoch at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    /// Starts a clock at zero.
    pub fn new() -> Self {
        MonotonicClock {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// A clock that only moves when told to. Used for deterministic replay.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    /// Creates a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current reading.
    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    /// Moves the reading forward by `step`.
    pub fn advance(&self, step: Duration) {
        self.now.set(self.now.get() + step);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// One independently clocked schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    period: Duration,
    last_fire: Duration,
}

impl Cadence {
    /// Creates a cadence that last fired at `start`.
    pub fn new(name: &'static str, period: Duration, start: Duration) -> Result<Self, SimError> {
        SimError::check_period(name, period)?;
        Ok(Cadence {
            period,
            last_fire: start,
        })
    }

    /// Fires if at least one period has elapsed since the last fire.
    ///
    /// Returns the actual elapsed time and restarts the cadence at `now`.
    pub fn poll(&mut self, now: Duration) -> Option<Duration> {
        let elapsed = now.saturating_sub(self.last_fire);
        if elapsed >= self.period {
            self.last_fire = now;
            Some(elapsed)
        } else {
            None
        }
    }

    /// The target period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// When the cadence last fired.
    pub fn last_fire(&self) -> Duration {
        self.last_fire
    }
}

/// Cadences that fired during one scheduler poll, with their elapsed times.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ticks {
    /// Physical state integration.
    pub simulation: Option<Duration>,
    /// Controller evaluation.
    pub control: Option<Duration>,
    /// Observation and output.
    pub display: Option<Duration>,
}

impl Ticks {
    /// True when no cadence fired.
    pub fn is_idle(&self) -> bool {
        self.simulation.is_none() && self.control.is_none() && self.display.is_none()
    }
}

/// Decides which of the three cadences are due on each poll.
#[derive(Debug, Clone)]
pub struct Scheduler {
    simulation: Cadence,
    control: Cadence,
    display: Cadence,
}

impl Scheduler {
    /// Creates a scheduler whose cadences all last fired at `start`.
    pub fn new(
        simulation_period: Duration,
        control_period: Duration,
        display_period: Duration,
        start: Duration,
    ) -> Result<Self, SimError> {
        Ok(Scheduler {
            simulation: Cadence::new("simulation", simulation_period, start)?,
            control: Cadence::new("control", control_period, start)?,
            display: Cadence::new("display", display_period, start)?,
        })
    }

    /// Polls every cadence against the same clock reading.
    pub fn poll(&mut self, now: Duration) -> Ticks {
        Ticks {
            simulation: self.simulation.poll(now),
            control: self.control.poll(now),
            display: self.display.poll(now),
        }
    }
}
