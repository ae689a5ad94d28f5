#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = "A `no_std` library for two-wheeled differential-drive vehicle kinematics."]
#![doc = ""]
#![doc = "This crate provides the wheel and vehicle state a simulation loop pushes"]
#![doc = "commands into once per tick, forward and inverse kinematics, forward-Euler"]
#![doc = "pose integration, and zero-order-hold velocity schedules for scripted maneuvers."]

extern crate alloc;

use core::fmt;
use libm::{cos, sin};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod angle;
pub mod error;
pub mod schedule;
pub mod trail;
pub mod vehicle;
pub mod wheel;

pub use angle::{deg_to_rad, normalize_angle, rad_to_deg};
pub use error::KinematicsError;
pub use schedule::{Maneuver, VelocitySchedule, WheelCommand};
pub use trail::Trail;
pub use vehicle::{StepRecord, Vehicle, VehicleConfig};
pub use wheel::Wheel;

/// A point in the world frame, in meters.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    /// World‑frame x coordinate (m).
    pub x: f64,
    /// World‑frame y coordinate (m).
    pub y: f64,
}

impl Point2 {
    /// Construct a new point.
    pub const fn new(x: f64, y: f64) -> Self {
        Point2 { x, y }
    }
}

impl fmt::Display for Point2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// A 2‑D pose `(x, y, θ)` in meters and radians (θ measured counter‑clockwise
/// from the x‑axis in the world frame).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    /// World‑frame x position (m).
    pub x: f64,
    /// World‑frame y position (m).
    pub y: f64,
    /// Heading (rad). Accumulates without wraparound; use
    /// [`normalize_angle`] when a bounded value is needed.
    pub theta: f64,
}

impl Pose {
    /// Construct a new pose.
    ///
    /// # Arguments
    ///
    /// * `x`: World-frame x position in meters.
    /// * `y`: World-frame y position in meters.
    /// * `theta`: Heading in radians.
    pub const fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose { x, y, theta }
    }

    /// The position part of the pose.
    pub const fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(x: {:.2}, y: {:.2}, θ: {:.2} rad)", self.x, self.y, self.theta)
    }
}

/// Left and right wheel tangential velocities, i.e. the linear speed of each
/// wheel's contact point.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelVelocities {
    /// Left wheel tangential velocity (m/s).
    pub left: f64,
    /// Right wheel tangential velocity (m/s).
    pub right: f64,
}

impl WheelVelocities {
    /// Construct wheel velocities.
    ///
    /// # Arguments
    ///
    /// * `left`: Left wheel tangential velocity (m/s).
    /// * `right`: Right wheel tangential velocity (m/s).
    pub const fn new(left: f64, right: f64) -> Self {
        WheelVelocities { left, right }
    }
}

impl fmt::Display for WheelVelocities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(vL: {:.2} m/s, vR: {:.2} m/s)", self.left, self.right)
    }
}

/// Linear and angular chassis velocities.
/// These represent the overall motion of the vehicle's centre.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChassisSpeeds {
    /// Linear speed of the chassis center (m/s).
    pub v: f64,
    /// Angular speed of the chassis (rad/s).
    pub omega: f64,
}

impl ChassisSpeeds {
    /// Construct chassis speeds.
    ///
    /// # Arguments
    ///
    /// * `v`: Linear speed of the chassis center (m/s).
    /// * `omega`: Angular speed of the chassis (rad/s).
    pub const fn new(v: f64, omega: f64) -> Self {
        ChassisSpeeds { v, omega }
    }
}

impl fmt::Display for ChassisSpeeds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(v: {:.2} m/s, ω: {:.2} rad/s)", self.v, self.omega)
    }
}

/// Differential‑drive kinematics helper.
///
/// This struct holds the validated geometry of the vehicle (wheel radius and
/// wheelbase) and provides the stateless kinematic relations the [`Vehicle`]
/// is built on.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialDrive {
    /// Wheel radius (m).
    wheel_radius: f64,
    /// Distance between the two wheel contact points (m).
    wheelbase: f64,
}

impl DifferentialDrive {
    /// Construct a new differential‑drive kinematics helper.
    ///
    /// # Arguments
    ///
    /// * `wheel_radius`: The radius of the vehicle's wheels in meters.
    /// * `wheelbase`: The distance between the two wheel contact points in meters.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidParameter)` if either value is not a
    /// positive, finite number.
    pub fn new(wheel_radius: f64, wheelbase: f64) -> Result<Self, KinematicsError> {
        if !(wheel_radius > 0.0 && wheel_radius.is_finite()) {
            return Err(KinematicsError::InvalidParameter(
                "wheel radius must be positive",
            ));
        }
        if !(wheelbase > 0.0 && wheelbase.is_finite()) {
            return Err(KinematicsError::InvalidParameter(
                "wheelbase must be positive",
            ));
        }
        Ok(DifferentialDrive {
            wheel_radius,
            wheelbase,
        })
    }

    /// Returns the wheel radius.
    pub fn wheel_radius(&self) -> f64 {
        self.wheel_radius
    }

    /// Returns the wheelbase.
    pub fn wheelbase(&self) -> f64 {
        self.wheelbase
    }

    /// Calculates the chassis speeds from the wheel tangential velocities.
    /// This is the forward kinematics problem.
    ///
    /// `v = (v_r + v_l) / 2`, `ω = (v_r − v_l) / l`.
    pub fn forward_kinematics(&self, wheels: WheelVelocities) -> ChassisSpeeds {
        let v = (wheels.right + wheels.left) / 2.0;
        let omega = (wheels.right - wheels.left) / self.wheelbase;

        ChassisSpeeds::new(v, omega)
    }

    /// Calculates the wheel tangential velocities that realise the given
    /// chassis speeds. This is the inverse kinematics problem.
    ///
    /// `v_r = (2v + lω) / 2`, `v_l = (2v − lω) / 2`.
    pub fn inverse_kinematics(&self, chassis: ChassisSpeeds) -> WheelVelocities {
        let right = (2.0 * chassis.v + self.wheelbase * chassis.omega) / 2.0;
        let left = (2.0 * chassis.v - self.wheelbase * chassis.omega) / 2.0;

        WheelVelocities::new(left, right)
    }

    /// Signed radius of the instantaneous centre of rotation,
    /// `(l/2)·(v_r + v_l)/(v_r − v_l)`. Positive when the centre lies to the
    /// left of the vehicle.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NumericIndeterminate)` when both wheels run
    /// at the same speed; the centre is then at infinity.
    pub fn icr_radius(&self, wheels: WheelVelocities) -> Result<f64, KinematicsError> {
        let difference = wheels.right - wheels.left;
        if difference == 0.0 {
            return Err(KinematicsError::NumericIndeterminate(
                "instantaneous centre of rotation is at infinity",
            ));
        }
        Ok((self.wheelbase / 2.0) * (wheels.right + wheels.left) / difference)
    }

    /// Advances a pose by one forward-Euler step.
    ///
    /// The heading is updated first and the translation uses the updated
    /// heading. The heading is not wrapped. Returns the new pose together with
    /// the displacement `(Δx, Δy)` of this step.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative or
    /// not finite.
    pub fn integrate(
        &self,
        current_pose: Pose,
        chassis: ChassisSpeeds,
        dt: f64,
    ) -> Result<(Pose, Point2), KinematicsError> {
        if !(dt >= 0.0 && dt.is_finite()) {
            return Err(KinematicsError::NegativeTimeDelta(
                "must be non-negative",
            ));
        }

        let theta = current_pose.theta + chassis.omega * dt;
        let delta = Point2::new(
            chassis.v * cos(theta) * dt,
            chassis.v * sin(theta) * dt,
        );

        Ok((
            Pose::new(current_pose.x + delta.x, current_pose.y + delta.y, theta),
            delta,
        ))
    }
}

impl fmt::Display for DifferentialDrive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DifferentialDrive (r: {:.3} m, l: {:.3} m)", self.wheel_radius, self.wheelbase)
    }
}
