// src/setpoint.rs

//! # Setpoint Sequencer
//!
//! Cycles through a fixed list of target angles, moving to the next one
//! each time a wall-clock interval elapses and wrapping at the end of the
//! list. There is no terminal state.

use crate::clock::Cadence;
use crate::{Number, SimError};
use log::debug;
use std::time::Duration;

/// Cursor over a fixed, ordered list of target angles.
#[derive(Debug, Clone)]
pub struct SetpointSequencer<T> {
    values: Vec<T>,
    index: usize,
    cadence: Cadence,
}

impl<T: Number> SetpointSequencer<T> {
    /// Creates a sequencer positioned at `start_index`, with its interval
    /// clock starting at `start`.
    pub fn new(
        values: Vec<T>,
        start_index: usize,
        interval: Duration,
        start: Duration,
    ) -> Result<Self, SimError> {
        if values.is_empty() {
            return Err(SimError::EmptySetpoints);
        }
        if start_index >= values.len() {
            return Err(SimError::SetpointIndexOutOfRange {
                index: start_index,
                len: values.len(),
            });
        }
        Ok(SetpointSequencer {
            values,
            index: start_index,
            cadence: Cadence::new("setpoint", interval, start)?,
        })
    }

    /// The active target.
    pub fn current(&self) -> T {
        self.values[self.index]
    }

    /// Position of the active target in the list.
    pub fn index(&self) -> usize {
        self.index
    }

    /// All targets in cycle order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Moves to the next target, wrapping to the front.
    pub fn advance(&mut self) -> T {
        self.index = (self.index + 1) % self.values.len();
        self.current()
    }

    /// Advances if the interval has elapsed. Returns whether it did.
    pub fn update(&mut self, now: Duration) -> bool {
        if self.cadence.poll(now).is_none() {
            return false;
        }
        let target = self.advance();
        debug!("setpoint changed to {:?} at {:?}", target, now);
        true
    }
}
