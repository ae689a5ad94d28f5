//! A single drive wheel.
//!
//! The wheel stores only its angular velocity; the tangential velocity is
//! always derived as `ω·r`, so the two can never disagree.

use libm::{cos, sin};

use crate::{KinematicsError, Point2, Trail};

/// One drive wheel of a differential-drive vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct Wheel {
    /// Wheel radius (m), fixed at construction.
    radius: f64,
    /// Angular velocity (rad/s).
    angular_velocity: f64,
    /// Angle of the mount point relative to the vehicle heading (rad).
    mounting_offset: f64,
    /// Distance from the vehicle centre to the contact point (m).
    mount_distance: f64,
    /// Current absolute position (m).
    position: Point2,
    trail: Trail,
}

impl Wheel {
    /// Construct a wheel at rest.
    ///
    /// The wheel starts with no mount distance, so its placeholder position is
    /// the vehicle centre until [`Wheel::with_mount_distance`] or the first
    /// [`Wheel::recalc_position`] places it.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidParameter)` if `radius` is not a
    /// positive, finite number.
    pub fn new(radius: f64, mounting_offset: f64) -> Result<Self, KinematicsError> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(KinematicsError::InvalidParameter(
                "wheel radius must be positive",
            ));
        }
        Ok(Wheel {
            radius,
            angular_velocity: 0.0,
            mounting_offset,
            mount_distance: 0.0,
            position: Point2::default(),
            trail: Trail::default(),
        })
    }

    /// Set the distance between the vehicle centre and this wheel, usually
    /// half the wheelbase, and move the placeholder position accordingly.
    pub fn with_mount_distance(mut self, mount_distance: f64) -> Self {
        self.mount_distance = mount_distance;
        self.position = Point2::new(
            mount_distance * cos(self.mounting_offset),
            mount_distance * sin(self.mounting_offset),
        );
        self
    }

    /// Retain up to `capacity` past positions; `0` disables the trail.
    pub fn with_trail_capacity(mut self, capacity: usize) -> Self {
        self.trail = Trail::new(capacity);
        self
    }

    /// Wheel radius (m).
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Mounting offset angle (rad).
    pub fn mounting_offset(&self) -> f64 {
        self.mounting_offset
    }

    /// Angular velocity (rad/s).
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    /// Tangential velocity of the contact point (m/s).
    pub fn tangential_velocity(&self) -> f64 {
        self.angular_velocity * self.radius
    }

    /// Set the angular velocity (rad/s).
    pub fn set_angular_velocity(&mut self, omega: f64) {
        self.angular_velocity = omega;
    }

    /// Set the tangential velocity (m/s); the angular velocity becomes `v/r`.
    pub fn set_tangential_velocity(&mut self, velocity: f64) {
        // radius > 0 is guaranteed by the constructor
        self.angular_velocity = velocity / self.radius;
    }

    /// Current absolute position.
    pub fn position(&self) -> Point2 {
        self.position
    }

    /// Move the wheel to follow the vehicle centre and heading. The previous
    /// position goes into the trail first.
    pub fn recalc_position(&mut self, center_x: f64, center_y: f64, heading: f64) {
        self.trail.record(self.position);
        self.place(center_x, center_y, heading);
    }

    /// Past positions, most recent first.
    pub fn history(&self) -> &Trail {
        &self.trail
    }

    /// Forget every past position.
    pub fn clear_history(&mut self) {
        self.trail.clear();
    }

    pub(crate) fn place(&mut self, center_x: f64, center_y: f64, heading: f64) {
        let angle = heading + self.mounting_offset;
        self.position = Point2::new(
            center_x + self.mount_distance * cos(angle),
            center_y + self.mount_distance * sin(angle),
        );
    }
}
