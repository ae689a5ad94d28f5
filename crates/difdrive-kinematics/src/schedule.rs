//! Open-loop velocity schedules for scripted maneuvers.
//!
//! A schedule maps simulation time to commanded wheel tangential velocities
//! with a zero-order hold: between two keys the earlier value stays in force.

use alloc::vec::Vec;
use core::f64::consts::FRAC_PI_2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{ChassisSpeeds, DifferentialDrive, KinematicsError, Vehicle, WheelVelocities};

/// Duration of every preset segment (s).
pub const SEGMENT_DURATION: f64 = 1.0;

/// The held command at a given time. A side is `None` before its first key.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelCommand {
    /// Left wheel tangential velocity (m/s).
    pub left: Option<f64>,
    /// Right wheel tangential velocity (m/s).
    pub right: Option<f64>,
}

/// Time-keyed wheel velocity tables, one per side.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VelocitySchedule {
    left: Vec<(f64, f64)>,
    right: Vec<(f64, f64)>,
}

impl VelocitySchedule {
    /// Build a schedule from `(time, velocity)` entries for each wheel.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidSchedule)` if the times of either
    /// list are not finite or not strictly increasing.
    pub fn new(left: Vec<(f64, f64)>, right: Vec<(f64, f64)>) -> Result<Self, KinematicsError> {
        validate(&left)?;
        validate(&right)?;
        Ok(VelocitySchedule { left, right })
    }

    /// A schedule commanding both wheels at the same instants.
    ///
    /// # Errors
    ///
    /// Same as [`VelocitySchedule::new`].
    pub fn from_wheel_velocities(
        entries: &[(f64, WheelVelocities)],
    ) -> Result<Self, KinematicsError> {
        let left = entries.iter().map(|(t, w)| (*t, w.left)).collect();
        let right = entries.iter().map(|(t, w)| (*t, w.right)).collect();
        Self::new(left, right)
    }

    /// The canned demonstration maneuver: straight, pivot, stop, pivot back,
    /// then cruise.
    pub fn fixed_vector() -> Self {
        VelocitySchedule {
            left: alloc::vec![(0.0, 2.0), (5.0, -1.0), (10.0, 0.0), (15.0, 2.0), (20.0, 1.0)],
            right: alloc::vec![(0.0, 2.0), (5.0, 1.0), (10.0, 0.0), (15.0, -2.0), (20.0, 1.0)],
        }
    }

    /// A closed square: four times "drive `side_length` metres in one
    /// segment, then pivot 90° counter-clockwise in one segment", then stop.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidParameter)` if `side_length` is not
    /// finite or `wheelbase` is not positive.
    pub fn rectangle(side_length: f64, wheelbase: f64) -> Result<Self, KinematicsError> {
        if !side_length.is_finite() {
            return Err(KinematicsError::InvalidParameter(
                "rectangle side must be finite",
            ));
        }
        let drive = preset_drive(wheelbase)?;
        let straight = WheelVelocities::new(side_length / SEGMENT_DURATION, side_length / SEGMENT_DURATION);
        let pivot = drive.inverse_kinematics(ChassisSpeeds::new(0.0, FRAC_PI_2 / SEGMENT_DURATION));

        let mut entries = Vec::with_capacity(9);
        let mut time = 0.0;
        for _ in 0..4 {
            entries.push((time, straight));
            time += SEGMENT_DURATION;
            entries.push((time, pivot));
            time += SEGMENT_DURATION;
        }
        entries.push((time, WheelVelocities::default()));
        Self::from_wheel_velocities(&entries)
    }

    /// An S-curve: a 90° left arc of `first_radius`, a straight of
    /// `straight_length`, then a 90° right arc of `second_radius`, one segment
    /// each, then stop.
    ///
    /// Left means counter-clockwise: the right wheel runs faster on the first
    /// arc.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidParameter)` if a radius is negative,
    /// any dimension is not finite, or `wheelbase` is not positive.
    pub fn curve(
        first_radius: f64,
        straight_length: f64,
        second_radius: f64,
        wheelbase: f64,
    ) -> Result<Self, KinematicsError> {
        for radius in [first_radius, second_radius] {
            if !(radius >= 0.0 && radius.is_finite()) {
                return Err(KinematicsError::InvalidParameter(
                    "curve radius must be non-negative",
                ));
            }
        }
        if !straight_length.is_finite() {
            return Err(KinematicsError::InvalidParameter(
                "curve straight length must be finite",
            ));
        }
        let drive = preset_drive(wheelbase)?;
        let turn_rate = FRAC_PI_2 / SEGMENT_DURATION;

        let first = drive.inverse_kinematics(ChassisSpeeds::new(turn_rate * first_radius, turn_rate));
        let straight = WheelVelocities::new(
            straight_length / SEGMENT_DURATION,
            straight_length / SEGMENT_DURATION,
        );
        let second = drive.inverse_kinematics(ChassisSpeeds::new(turn_rate * second_radius, -turn_rate));

        Self::from_wheel_velocities(&[
            (0.0, first),
            (SEGMENT_DURATION, straight),
            (2.0 * SEGMENT_DURATION, second),
            (3.0 * SEGMENT_DURATION, WheelVelocities::default()),
        ])
    }

    /// The held command at time `t`: for each side, the value of the greatest
    /// key not after `t`.
    pub fn query(&self, t: f64) -> WheelCommand {
        WheelCommand {
            left: hold(&self.left, t),
            right: hold(&self.right, t),
        }
    }

    /// Push the held command at `t` into the vehicle's wheels. A side with no
    /// command yet is left as it is.
    pub fn apply(&self, t: f64, vehicle: &mut Vehicle) -> WheelCommand {
        let command = self.query(t);
        if let Some(v) = command.left {
            vehicle.left_wheel_mut().set_tangential_velocity(v);
        }
        if let Some(v) = command.right {
            vehicle.right_wheel_mut().set_tangential_velocity(v);
        }
        command
    }

    /// Time of the last key on either side; `None` for an empty schedule.
    pub fn end_time(&self) -> Option<f64> {
        let left = self.left.last().map(|(t, _)| *t);
        let right = self.right.last().map(|(t, _)| *t);
        match (left, right) {
            (Some(l), Some(r)) => Some(if l > r { l } else { r }),
            (l, r) => l.or(r),
        }
    }

    /// Left wheel entries.
    pub fn left_entries(&self) -> &[(f64, f64)] {
        &self.left
    }

    /// Right wheel entries.
    pub fn right_entries(&self) -> &[(f64, f64)] {
        &self.right
    }

    /// Whether neither side has an entry.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

fn validate(entries: &[(f64, f64)]) -> Result<(), KinematicsError> {
    if entries.iter().any(|(t, _)| !t.is_finite()) {
        return Err(KinematicsError::InvalidSchedule("times must be finite"));
    }
    if entries.windows(2).any(|pair| pair[1].0 <= pair[0].0) {
        return Err(KinematicsError::InvalidSchedule(
            "times must be strictly increasing",
        ));
    }
    Ok(())
}

fn hold(entries: &[(f64, f64)], t: f64) -> Option<f64> {
    let idx = entries.partition_point(|(key, _)| *key <= t);
    idx.checked_sub(1).map(|i| entries[i].1)
}

fn preset_drive(wheelbase: f64) -> Result<DifferentialDrive, KinematicsError> {
    // Presets only speak tangential velocities, the radius is irrelevant.
    DifferentialDrive::new(1.0, wheelbase)
}

/// A named maneuver a schedule can be built from.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Maneuver {
    /// [`VelocitySchedule::fixed_vector`].
    Vector,
    /// [`VelocitySchedule::rectangle`].
    Rectangle {
        /// Side length (m).
        side_length: f64,
    },
    /// [`VelocitySchedule::curve`].
    Curve {
        /// Radius of the first, left-hand arc (m).
        first_radius: f64,
        /// Length of the straight between the arcs (m).
        straight_length: f64,
        /// Radius of the second, right-hand arc (m).
        second_radius: f64,
    },
    /// Hand-written `(time, velocity)` tables.
    Custom {
        /// Left wheel entries.
        left: Vec<(f64, f64)>,
        /// Right wheel entries.
        right: Vec<(f64, f64)>,
    },
}

impl Maneuver {
    /// Build the schedule for a vehicle with the given wheelbase.
    ///
    /// # Errors
    ///
    /// Propagates the errors of the matching [`VelocitySchedule`] constructor.
    pub fn build(&self, wheelbase: f64) -> Result<VelocitySchedule, KinematicsError> {
        match self {
            Maneuver::Vector => Ok(VelocitySchedule::fixed_vector()),
            Maneuver::Rectangle { side_length } => VelocitySchedule::rectangle(*side_length, wheelbase),
            Maneuver::Curve {
                first_radius,
                straight_length,
                second_radius,
            } => VelocitySchedule::curve(*first_radius, *straight_length, *second_radius, wheelbase),
            Maneuver::Custom { left, right } => VelocitySchedule::new(left.clone(), right.clone()),
        }
    }

    /// Short lowercase name, as used in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Maneuver::Vector => "vector",
            Maneuver::Rectangle { .. } => "rectangle",
            Maneuver::Curve { .. } => "curve",
            Maneuver::Custom { .. } => "custom",
        }
    }
}
