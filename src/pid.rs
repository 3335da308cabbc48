// src/pid.rs

//! # PID Control Module
//!
//! This module provides the compute callback and control data structure
//! used to perform PID (Proportional-Integral-Derivative) control
//! calculations on the bar angle.

pub mod angle;
pub use angle::*;
