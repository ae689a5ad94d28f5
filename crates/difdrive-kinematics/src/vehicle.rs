//! The differential-drive vehicle: two wheels on a common axle, a pose, and
//! the forward-Euler integrator that moves one from the other.

use core::f64::consts::FRAC_PI_2;
use core::fmt;
use libm::{cos, sin};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::trail::DEFAULT_TRAIL_CAPACITY;
use crate::{
    ChassisSpeeds, DifferentialDrive, KinematicsError, Point2, Pose, Trail, Wheel,
    WheelVelocities,
};

/// Default distance between the wheel contact points (m).
pub const DEFAULT_WHEELBASE: f64 = 0.2;
/// Default wheel radius (m).
pub const DEFAULT_WHEEL_RADIUS: f64 = 0.05;

/// Construction options for a [`Vehicle`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleConfig {
    /// Distance between the wheel contact points (m).
    pub wheelbase: f64,
    /// Radius of both wheels (m).
    pub wheel_radius: f64,
    /// Number of past vehicle positions to keep; `0` disables the trail.
    pub trail_capacity: usize,
    /// Number of past positions each wheel keeps; `0` disables the trails.
    pub wheel_trail_capacity: usize,
    /// Compute the instantaneous centre of rotation on every step.
    pub track_icr: bool,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        VehicleConfig {
            wheelbase: DEFAULT_WHEELBASE,
            wheel_radius: DEFAULT_WHEEL_RADIUS,
            trail_capacity: DEFAULT_TRAIL_CAPACITY,
            wheel_trail_capacity: DEFAULT_TRAIL_CAPACITY,
            track_icr: true,
        }
    }
}

/// One line of per-step diagnostics.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepRecord {
    /// Step size used for the last advance (s).
    pub dt: f64,
    /// Simulation time (s).
    pub t: f64,
    /// Position x (m).
    pub x: f64,
    /// Last x displacement (m).
    pub dx: f64,
    /// Position y (m).
    pub y: f64,
    /// Last y displacement (m).
    pub dy: f64,
    /// Left wheel tangential velocity (m/s).
    pub v_left: f64,
    /// Right wheel tangential velocity (m/s).
    pub v_right: f64,
    /// Vehicle linear velocity (m/s).
    pub v: f64,
    /// Vehicle angular velocity (rad/s).
    pub omega: f64,
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dt = {:.6} | t = {:.4} | x = {:.6} | dx = {:.6} | y = {:.6} | dy = {:.6} | v_l = {:.6} | v_r = {:.6} | v_t = {:.6} | omega_t = {:.6}",
            self.dt, self.t, self.x, self.dx, self.y, self.dy, self.v_left, self.v_right, self.v, self.omega
        )
    }
}

/// A two-wheeled differential-drive vehicle.
///
/// The wheels' tangential velocities are the source of truth while advancing;
/// the chassis speeds are the source of truth when commanding the vehicle as
/// a whole through [`Vehicle::set_tangential_velocity`] and
/// [`Vehicle::set_angular_velocity`].
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    drive: DifferentialDrive,
    pose: Pose,
    chassis: ChassisSpeeds,
    displacement: Point2,
    icr_radius: Option<f64>,
    track_icr: bool,
    trail: Trail,
    left: Wheel,
    right: Wheel,
}

impl Vehicle {
    /// A vehicle with the given wheelbase and default options.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidParameter)` if `wheelbase` is not
    /// positive.
    pub fn new(wheelbase: f64) -> Result<Self, KinematicsError> {
        Self::from_config(&VehicleConfig {
            wheelbase,
            ..VehicleConfig::default()
        })
    }

    /// A vehicle built from explicit options.
    ///
    /// The left wheel is mounted at `−π/2` and the right wheel at `+π/2`
    /// relative to the heading, each half a wheelbase from the centre.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::InvalidParameter)` if the wheelbase or the
    /// wheel radius is not positive.
    pub fn from_config(config: &VehicleConfig) -> Result<Self, KinematicsError> {
        let drive = DifferentialDrive::new(config.wheel_radius, config.wheelbase)?;
        let half = config.wheelbase / 2.0;
        let left = Wheel::new(config.wheel_radius, -FRAC_PI_2)?
            .with_mount_distance(half)
            .with_trail_capacity(config.wheel_trail_capacity);
        let right = Wheel::new(config.wheel_radius, FRAC_PI_2)?
            .with_mount_distance(half)
            .with_trail_capacity(config.wheel_trail_capacity);

        Ok(Vehicle {
            drive,
            pose: Pose::default(),
            chassis: ChassisSpeeds::default(),
            displacement: Point2::default(),
            icr_radius: None,
            track_icr: config.track_icr,
            trail: Trail::new(config.trail_capacity),
            left,
            right,
        })
    }

    /// Vehicle geometry.
    pub fn drive(&self) -> &DifferentialDrive {
        &self.drive
    }

    /// Distance between the wheel contact points (m).
    pub fn wheelbase(&self) -> f64 {
        self.drive.wheelbase()
    }

    /// Current pose. The heading is unbounded.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Linear velocity of the centre (m/s).
    pub fn tangential_velocity(&self) -> f64 {
        self.chassis.v
    }

    /// Angular velocity about the centre (rad/s).
    pub fn angular_velocity(&self) -> f64 {
        self.chassis.omega
    }

    /// Linear and angular velocity together.
    pub fn chassis_speeds(&self) -> ChassisSpeeds {
        self.chassis
    }

    /// Displacement produced by the last [`Vehicle::advance`].
    pub fn displacement(&self) -> Point2 {
        self.displacement
    }

    /// The left wheel.
    pub fn left_wheel(&self) -> &Wheel {
        &self.left
    }

    /// The right wheel.
    pub fn right_wheel(&self) -> &Wheel {
        &self.right
    }

    /// Mutable access to the left wheel, for wheel-level commands.
    pub fn left_wheel_mut(&mut self) -> &mut Wheel {
        &mut self.left
    }

    /// Mutable access to the right wheel, for wheel-level commands.
    pub fn right_wheel_mut(&mut self) -> &mut Wheel {
        &mut self.right
    }

    /// Current tangential velocities of both wheels.
    pub fn wheel_velocities(&self) -> WheelVelocities {
        WheelVelocities::new(self.left.tangential_velocity(), self.right.tangential_velocity())
    }

    /// Command both wheels directly.
    pub fn set_wheel_velocities(&mut self, wheels: WheelVelocities) {
        self.left.set_tangential_velocity(wheels.left);
        self.right.set_tangential_velocity(wheels.right);
    }

    /// Command the angular velocity, keeping the last linear velocity, and
    /// derive both wheel speeds from the pair.
    pub fn set_angular_velocity(&mut self, omega: f64) {
        self.chassis.omega = omega;
        self.apply_chassis_speeds();
    }

    /// Command the linear velocity, keeping the last angular velocity, and
    /// derive both wheel speeds from the pair.
    pub fn set_tangential_velocity(&mut self, velocity: f64) {
        self.chassis.v = velocity;
        self.apply_chassis_speeds();
    }

    /// Command linear and angular velocity at once.
    pub fn set_chassis_speeds(&mut self, chassis: ChassisSpeeds) {
        self.chassis = chassis;
        self.apply_chassis_speeds();
    }

    fn apply_chassis_speeds(&mut self) {
        let wheels = self.drive.inverse_kinematics(self.chassis);
        self.set_wheel_velocities(wheels);
    }

    /// Integrate one forward-Euler step of `dt` seconds.
    ///
    /// The chassis speeds are recomputed from the wheel velocities, the heading
    /// advances by `ω·dt`, then the centre moves by `v·dt` along the new
    /// heading and both wheels follow. The previous position goes into the
    /// trail. With ICR tracking on, the radius is refreshed, or cleared when
    /// both wheels run at the same speed.
    ///
    /// # Errors
    ///
    /// Returns `Err(KinematicsError::NegativeTimeDelta)` if `dt` is negative or
    /// not finite; the vehicle is left untouched.
    pub fn advance(&mut self, dt: f64) -> Result<(), KinematicsError> {
        let wheels = self.wheel_velocities();
        let chassis = self.drive.forward_kinematics(wheels);
        let (pose, displacement) = self.drive.integrate(self.pose, chassis, dt)?;

        self.trail.record(self.pose.position());
        self.chassis = chassis;
        self.pose = pose;
        self.displacement = displacement;

        self.left.recalc_position(pose.x, pose.y, pose.theta);
        self.right.recalc_position(pose.x, pose.y, pose.theta);

        if self.track_icr {
            self.icr_radius = self.drive.icr_radius(wheels).ok();
        }
        Ok(())
    }

    /// Signed radius of the instantaneous centre of rotation at the last step.
    ///
    /// `None` while driving straight, before the first step, or when tracking
    /// is disabled.
    pub fn icr_radius(&self) -> Option<f64> {
        self.icr_radius
    }

    /// World position of the instantaneous centre of rotation, when defined.
    pub fn icr_point(&self) -> Option<Point2> {
        self.icr_radius.map(|r| {
            Point2::new(
                self.pose.x - r * sin(self.pose.theta),
                self.pose.y + r * cos(self.pose.theta),
            )
        })
    }

    /// Zero the pose, the chassis speeds and both wheels' velocities.
    ///
    /// Histories are kept; see [`Vehicle::clear_history`].
    pub fn reset_position(&mut self) {
        self.set_chassis_speeds(ChassisSpeeds::default());
        self.pose = Pose::default();
        self.displacement = Point2::default();
        self.icr_radius = None;
        self.left.place(0.0, 0.0, 0.0);
        self.right.place(0.0, 0.0, 0.0);
    }

    /// Past centre positions, most recent first.
    pub fn history(&self) -> &Trail {
        &self.trail
    }

    /// Empty the vehicle trail and both wheel trails.
    pub fn clear_history(&mut self) {
        self.trail.clear();
        self.left.clear_history();
        self.right.clear_history();
    }

    /// Snapshot of the diagnostics for a step of `dt` ending at time `t`.
    pub fn step_record(&self, dt: f64, t: f64) -> StepRecord {
        let wheels = self.wheel_velocities();
        StepRecord {
            dt,
            t,
            x: self.pose.x,
            dx: self.displacement.x,
            y: self.pose.y,
            dy: self.displacement.y,
            v_left: wheels.left,
            v_right: wheels.right,
            v: self.chassis.v,
            omega: self.chassis.omega,
        }
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vehicle {} {}", self.pose, self.chassis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::PI;
    const EPSILON: f64 = 1e-6;

    fn test_vehicle() -> Vehicle {
        Vehicle::from_config(&VehicleConfig {
            wheelbase: 0.2,
            wheel_radius: 0.05,
            ..VehicleConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_constructor_invalid_wheelbase() {
        assert!(matches!(Vehicle::new(0.0), Err(KinematicsError::InvalidParameter(_))));
        assert!(matches!(Vehicle::new(-0.2), Err(KinematicsError::InvalidParameter(_))));
    }

    #[test]
    fn test_constructor_invalid_wheel_radius() {
        let config = VehicleConfig {
            wheel_radius: 0.0,
            ..VehicleConfig::default()
        };
        assert!(matches!(Vehicle::from_config(&config), Err(KinematicsError::InvalidParameter(_))));
    }

    #[test]
    fn test_initial_wheel_placement() {
        let vehicle = test_vehicle();
        assert!((vehicle.left_wheel().position().y - (-0.1)).abs() < EPSILON);
        assert!((vehicle.right_wheel().position().y - 0.1).abs() < EPSILON);
        assert_eq!(vehicle.pose(), Pose::default());
    }

    #[test]
    fn test_straight_line_step() {
        let mut vehicle = test_vehicle();
        vehicle.left_wheel_mut().set_tangential_velocity(1.0);
        vehicle.right_wheel_mut().set_tangential_velocity(1.0);
        vehicle.advance(1.0).unwrap();

        assert!((vehicle.angular_velocity() - 0.0).abs() < EPSILON);
        assert!((vehicle.tangential_velocity() - 1.0).abs() < EPSILON);
        assert!((vehicle.pose().theta - 0.0).abs() < EPSILON);
        assert!((vehicle.pose().x - 1.0).abs() < EPSILON);
        assert!((vehicle.pose().y - 0.0).abs() < EPSILON);
        assert!((vehicle.displacement().x - 1.0).abs() < EPSILON);
        assert_eq!(vehicle.icr_radius(), None);
        assert_eq!(vehicle.icr_point(), None);
    }

    #[test]
    fn test_equal_wheel_speeds_keep_heading() {
        let mut vehicle = test_vehicle();
        vehicle.set_chassis_speeds(ChassisSpeeds::new(0.0, 1.0));
        vehicle.advance(0.5).unwrap();
        let heading = vehicle.pose().theta;

        vehicle.set_wheel_velocities(WheelVelocities::new(-0.3, -0.3));
        for _ in 0..10 {
            vehicle.advance(0.1).unwrap();
        }
        assert!((vehicle.pose().theta - heading).abs() < EPSILON);
        assert_eq!(vehicle.icr_radius(), None);
    }

    #[test]
    fn test_half_turn_in_place() {
        let mut vehicle = test_vehicle();
        vehicle.left_wheel_mut().set_tangential_velocity(-1.0);
        vehicle.right_wheel_mut().set_tangential_velocity(1.0);
        vehicle.advance(PI * 0.2 / 2.0).unwrap();

        assert!((vehicle.angular_velocity() - 10.0).abs() < EPSILON);
        assert!((vehicle.pose().theta - PI).abs() < EPSILON);
        assert!(vehicle.pose().x.abs() < EPSILON);
        assert!(vehicle.pose().y.abs() < EPSILON);
        // The wheels have swapped sides.
        assert!((vehicle.left_wheel().position().y - 0.1).abs() < EPSILON);
        assert!((vehicle.right_wheel().position().y - (-0.1)).abs() < EPSILON);
        assert!(vehicle.icr_radius().unwrap().abs() < EPSILON);
    }

    #[test]
    fn test_rotation_in_place_only_changes_heading() {
        let mut vehicle = test_vehicle();
        vehicle.set_angular_velocity(0.7);
        for _ in 0..25 {
            let before = vehicle.pose();
            vehicle.advance(0.04).unwrap();
            assert!((vehicle.pose().x - before.x).abs() < EPSILON);
            assert!((vehicle.pose().y - before.y).abs() < EPSILON);
            assert!((vehicle.pose().theta - before.theta - 0.7 * 0.04).abs() < EPSILON);
        }
    }

    #[test]
    fn test_inverse_kinematics_holds_other_component() {
        let mut vehicle = test_vehicle();
        vehicle.set_tangential_velocity(1.0);
        vehicle.set_angular_velocity(2.0);
        // v_r = (2 + 0.2 * 2) / 2 = 1.2, v_l = (2 - 0.4) / 2 = 0.8
        let wheels = vehicle.wheel_velocities();
        assert!((wheels.left - 0.8).abs() < EPSILON);
        assert!((wheels.right - 1.2).abs() < EPSILON);

        vehicle.set_tangential_velocity(0.0);
        let wheels = vehicle.wheel_velocities();
        assert!((wheels.left - (-0.2)).abs() < EPSILON);
        assert!((wheels.right - 0.2).abs() < EPSILON);
    }

    #[test]
    fn test_arc_icr() {
        let mut vehicle = test_vehicle();
        vehicle.set_wheel_velocities(WheelVelocities::new(0.5, 1.5));
        vehicle.advance(0.0).unwrap();
        let radius = vehicle.icr_radius().unwrap();
        assert!((radius - 0.2).abs() < EPSILON);
        let centre = vehicle.icr_point().unwrap();
        assert!(centre.x.abs() < EPSILON);
        assert!((centre.y - 0.2).abs() < EPSILON);
    }

    #[test]
    fn test_icr_tracking_disabled() {
        let mut vehicle = Vehicle::from_config(&VehicleConfig {
            track_icr: false,
            ..VehicleConfig::default()
        })
        .unwrap();
        vehicle.set_wheel_velocities(WheelVelocities::new(0.5, 1.5));
        vehicle.advance(0.1).unwrap();
        assert_eq!(vehicle.icr_radius(), None);
    }

    #[test]
    fn test_advance_rejects_negative_dt() {
        let mut vehicle = test_vehicle();
        vehicle.set_tangential_velocity(1.0);
        let before = vehicle.clone();
        let result = vehicle.advance(-0.01);
        assert!(matches!(result, Err(KinematicsError::NegativeTimeDelta(_))));
        assert_eq!(vehicle, before);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut vehicle = Vehicle::from_config(&VehicleConfig {
            trail_capacity: 5,
            wheel_trail_capacity: 3,
            ..VehicleConfig::default()
        })
        .unwrap();
        vehicle.set_tangential_velocity(1.0);
        for _ in 0..20 {
            vehicle.advance(0.1).unwrap();
        }
        assert_eq!(vehicle.history().len(), 5);
        assert_eq!(vehicle.left_wheel().history().len(), 3);
        assert_eq!(vehicle.right_wheel().history().len(), 3);
        // Most recent first: the position before the last step.
        assert!((vehicle.history().latest().unwrap().x - 1.9).abs() < EPSILON);
    }

    #[test]
    fn test_reset_position_is_idempotent_and_keeps_history() {
        let mut vehicle = test_vehicle();
        vehicle.set_chassis_speeds(ChassisSpeeds::new(0.5, 0.3));
        for _ in 0..10 {
            vehicle.advance(0.1).unwrap();
        }
        let trail_len = vehicle.history().len();

        vehicle.reset_position();
        let once = vehicle.clone();
        vehicle.reset_position();
        assert_eq!(vehicle, once);

        assert_eq!(vehicle.pose(), Pose::default());
        assert_eq!(vehicle.chassis_speeds(), ChassisSpeeds::default());
        assert_eq!(vehicle.wheel_velocities(), WheelVelocities::default());
        assert_eq!(vehicle.icr_radius(), None);
        assert_eq!(vehicle.history().len(), trail_len);

        vehicle.clear_history();
        assert!(vehicle.history().is_empty());
        assert!(vehicle.left_wheel().history().is_empty());
        assert!(vehicle.right_wheel().history().is_empty());
    }

    #[test]
    fn test_step_record() {
        let mut vehicle = test_vehicle();
        vehicle.set_wheel_velocities(WheelVelocities::new(1.0, 1.0));
        vehicle.advance(0.5).unwrap();
        let record = vehicle.step_record(0.5, 0.5);
        assert!((record.x - 0.5).abs() < EPSILON);
        assert!((record.dx - 0.5).abs() < EPSILON);
        assert!((record.v - 1.0).abs() < EPSILON);
        assert!((record.v_left - 1.0).abs() < EPSILON);

        let line = record.to_string();
        assert!(line.starts_with("dt = 0.500000 | t = 0.5000 | x = 0.500000"));
        assert!(line.ends_with("omega_t = 0.000000"));
    }
}
