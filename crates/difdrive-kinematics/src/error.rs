//! Error types for the kinematics library.
//!
//! Every failure here is local and synchronous: a bad parameter handed to a
//! constructor, a malformed schedule, or a quantity that has no finite value.

use core::fmt;

/// Errors that can occur in kinematic calculations.
#[derive(Debug, Clone, PartialEq)]
pub enum KinematicsError {
    /// A physical parameter is out of range.
    /// Returned when a wheel radius or wheelbase is not positive, or a preset
    /// dimension is not a finite number.
    InvalidParameter(&'static str),
    /// Error for negative time delta.
    /// This variant is returned when a negative or non-finite time delta is
    /// used to advance the vehicle.
    NegativeTimeDelta(&'static str),
    /// A velocity schedule whose time keys are not strictly increasing.
    InvalidSchedule(&'static str),
    /// The requested quantity is undefined for the current state, e.g. the
    /// instantaneous centre of rotation while both wheels run at equal speed.
    NumericIndeterminate(&'static str),
}

impl fmt::Display for KinematicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KinematicsError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            KinematicsError::NegativeTimeDelta(msg) => write!(f, "Negative time delta: {}", msg),
            KinematicsError::InvalidSchedule(msg) => write!(f, "Invalid schedule: {}", msg),
            KinematicsError::NumericIndeterminate(msg) => write!(f, "Numerically indeterminate: {}", msg),
        }
    }
}

impl core::error::Error for KinematicsError {}
