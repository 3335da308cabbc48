// src/shared.rs

//! Thread-safe hand-off points between the simulation loop and
//! collaborators running on other threads.
//!
//! The loop itself is single threaded. A slider thread writes gains into a
//! [`SharedGains`] which the loop samples once per simulation tick, and a
//! render thread reads the newest [`Frame`] from a [`SharedFrame`]. Both
//! exchange whole values under a lock, so neither side can observe a torn
//! update.

use crate::controller::Gains;
use crate::simulation::{Frame, FrameSink, GainSource};
use crate::Number;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Gains shared with a tuning collaborator.
#[derive(Debug, Clone)]
pub struct SharedGains<T> {
    gains: Arc<Mutex<Gains<T>>>,
}

impl<T: Number> SharedGains<T> {
    /// Creates a handle holding `gains`.
    pub fn new(gains: Gains<T>) -> Self {
        Self {
            gains: Arc::new(Mutex::new(gains)),
        }
    }

    /// Replaces the gains.
    pub fn set(&self, gains: Gains<T>) {
        *self.gains.lock() = gains;
    }

    /// Edits the gains in place.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Gains<T>),
    {
        let mut gains = self.gains.lock();
        f(&mut *gains);
    }

    /// Copy of the current gains.
    pub fn get(&self) -> Gains<T> {
        *self.gains.lock()
    }
}

impl<T: Number> GainSource<T> for SharedGains<T> {
    fn gains(&self) -> Gains<T> {
        self.get()
    }
}

/// Latest-frame mailbox for a render thread.
#[derive(Debug, Clone)]
pub struct SharedFrame<T> {
    latest: Arc<RwLock<Option<Arc<Frame<T>>>>>,
    published: Arc<AtomicU64>,
}

impl<T: Number> SharedFrame<T> {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self {
            latest: Arc::new(RwLock::new(None)),
            published: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replaces the newest frame.
    pub fn publish(&self, frame: Frame<T>) {
        *self.latest.write() = Some(Arc::new(frame));
        self.published.fetch_add(1, Ordering::Release);
    }

    /// The newest frame, if any has been published.
    pub fn latest(&self) -> Option<Arc<Frame<T>>> {
        self.latest.read().clone()
    }

    /// Number of frames published so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

impl<T: Number> Default for SharedFrame<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Number> FrameSink<T> for SharedFrame<T> {
    fn present(&mut self, frame: &Frame<T>) {
        self.publish(frame.clone());
    }
}
