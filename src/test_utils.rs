// src/test_utils.rs

//! This module contains utilities for testing.

/// A constant defining the tolerance within which floating-point values
/// are considered close enough to be equal.
pub const TEST_TOLERANCE: f32 = 1e-5;

/// Checks if two floating point numbers are close enough to be considered
/// equal.
///
/// # Arguments
/// * `target` - The target value.
/// * `value` - The value to compare against the target.
///
/// # Returns
/// `true` if the absolute difference between `target` and `value` is less than
/// `TEST_TOLERANCE` scaled by the magnitude of `target`, otherwise `false`.
pub fn value_close(target: f32, value: f32) -> bool {
    (target - value).abs() < TEST_TOLERANCE * target.abs().max(1.0)
}

/// Checks if two floating point numbers are not close enough to be
/// considered equal.
pub fn value_not_close(target: f32, value: f32) -> bool {
    !value_close(target, value)
}
