// src/history.rs

//! # Sliding-Window History
//!
//! Keeps the trailing window of `(time, angle, setpoint)` samples recorded at
//! each simulation tick. The three series are stored in parallel deques that
//! are appended at the back and evicted from the front in lock step, so they
//! always have equal length and index-aligned entries.
//!
//! Readers never look at the live deques. [`HistoryBuffer::snapshot`] copies
//! the window into an immutable [`HistorySnapshot`], which can be handed to a
//! rendering collaborator on another thread without it ever observing a
//! half-finished append or prune.

use crate::Number;
use std::collections::VecDeque;

/// One recorded sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySample<T> {
    /// Seconds since the start of the simulation.
    ///
    /// Stored in `T`, so long runs are limited by its range and precision.
    /// On `f32` the 10 ms spacing is lost after roughly a day of simulated
    /// time; on `I16F16` the value leaves the range after about nine hours,
    /// at which point [`Simulation::poll`](crate::Simulation::poll) returns
    /// [`SimError::Unrepresentable`](crate::SimError::Unrepresentable).
    pub time: T,
    /// Bar angle in degrees.
    pub angle: T,
    /// Target angle in degrees at the time of the sample.
    pub setpoint: T,
}

/// Time-windowed record of the bar angle and its setpoint.
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer<T> {
    times: VecDeque<T>,
    angles: VecDeque<T>,
    setpoints: VecDeque<T>,
}

impl<T: Number> HistoryBuffer<T> {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        HistoryBuffer {
            times: VecDeque::new(),
            angles: VecDeque::new(),
            setpoints: VecDeque::new(),
        }
    }

    /// Creates an empty buffer with room for `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        HistoryBuffer {
            times: VecDeque::with_capacity(capacity),
            angles: VecDeque::with_capacity(capacity),
            setpoints: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends one sample to the back of every series.
    pub fn append(&mut self, time: T, angle: T, setpoint: T) {
        self.times.push_back(time);
        self.angles.push_back(angle);
        self.setpoints.push_back(setpoint);
        self.check_aligned();
    }

    /// Evicts samples from the front while they are more than `window`
    /// older than `now`. Returns the number of samples evicted.
    pub fn prune(&mut self, now: T, window: T) -> usize {
        let mut evicted = 0;
        while let Some(&earliest) = self.times.front() {
            if now - earliest <= window {
                break;
            }
            self.times.pop_front();
            self.angles.pop_front();
            self.setpoints.pop_front();
            evicted += 1;
        }
        self.check_aligned();
        evicted
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True when no samples are held.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The most recently appended sample.
    pub fn latest(&self) -> Option<HistorySample<T>> {
        Some(HistorySample {
            time: *self.times.back()?,
            angle: *self.angles.back()?,
            setpoint: *self.setpoints.back()?,
        })
    }

    /// Iterates the samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = HistorySample<T>> + '_ {
        self.times
            .iter()
            .zip(&self.angles)
            .zip(&self.setpoints)
            .map(|((&time, &angle), &setpoint)| HistorySample {
                time,
                angle,
                setpoint,
            })
    }

    /// Copies the current window into an immutable snapshot.
    pub fn snapshot(&self) -> HistorySnapshot<T> {
        HistorySnapshot {
            times: self.times.iter().copied().collect(),
            angles: self.angles.iter().copied().collect(),
            setpoints: self.setpoints.iter().copied().collect(),
        }
    }

    fn check_aligned(&self) {
        assert!(
            self.times.len() == self.angles.len() && self.times.len() == self.setpoints.len(),
            "history series out of step: {} times, {} angles, {} setpoints",
            self.times.len(),
            self.angles.len(),
            self.setpoints.len()
        );
    }
}

/// Vertical plot range for a history window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotBounds<T> {
    /// Lowest angle shown.
    pub min: T,
    /// Highest angle shown.
    pub max: T,
}

impl<T: Number> PlotBounds<T> {
    /// Height of the range. Never zero.
    pub fn span(&self) -> T {
        let span = self.max - self.min;
        if span == T::zero() {
            T::one()
        } else {
            span
        }
    }
}

/// Immutable point-in-time copy of a [`HistoryBuffer`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistorySnapshot<T> {
    times: Vec<T>,
    angles: Vec<T>,
    setpoints: Vec<T>,
}

impl<T: Number> HistorySnapshot<T> {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// True when the snapshot holds no samples.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Sample times in seconds, oldest first.
    pub fn times(&self) -> &[T] {
        &self.times
    }

    /// Bar angles, index-aligned with [`times`](Self::times).
    pub fn angles(&self) -> &[T] {
        &self.angles
    }

    /// Setpoints, index-aligned with [`times`](Self::times).
    pub fn setpoints(&self) -> &[T] {
        &self.setpoints
    }

    /// Iterates the samples from oldest to newest.
    pub fn samples(&self) -> impl Iterator<Item = HistorySample<T>> + '_ {
        self.times
            .iter()
            .zip(&self.angles)
            .zip(&self.setpoints)
            .map(|((&time, &angle), &setpoint)| HistorySample {
                time,
                angle,
                setpoint,
            })
    }

    /// The newest sample.
    pub fn latest(&self) -> Option<HistorySample<T>> {
        self.samples().last()
    }

    /// Angle range for plotting against a zero reference line.
    ///
    /// The angle extremes are widened to include zero, then each side is
    /// pushed out by half its distance from the midpoint. Needs at least two
    /// samples.
    pub fn plot_bounds(&self) -> Option<PlotBounds<T>> {
        if self.angles.len() < 2 {
            return None;
        }
        let (mut low, mut high) = (T::zero(), T::zero());
        for &angle in &self.angles {
            if angle < low {
                low = angle;
            }
            if high < angle {
                high = angle;
            }
        }
        let two = T::one() + T::one();
        let mean = (low + high) / two;
        Some(PlotBounds {
            min: low - (mean - low) / two,
            max: high + (high - mean) / two,
        })
    }
}
