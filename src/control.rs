//! Manual drive commands, applied through the vehicle-level inverse
//! kinematics.

use difdrive_kinematics::Vehicle;
use tracing::debug;

use crate::config::ManualSettings;

/// One discrete command from a keyboard or another manual source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriveCommand {
    /// Raise the linear velocity by one step.
    Faster,
    /// Lower the linear velocity by one step.
    Slower,
    /// Raise the angular velocity (counter-clockwise) by one step.
    TurnLeft,
    /// Lower the angular velocity by one step.
    TurnRight,
    /// Zero the linear velocity, keep turning.
    StopLinear,
    /// Zero the angular velocity, keep driving.
    StopAngular,
    /// Zero both.
    Halt,
}

impl DriveCommand {
    pub fn apply(self, vehicle: &mut Vehicle, steps: &ManualSettings) {
        let v = vehicle.tangential_velocity();
        let omega = vehicle.angular_velocity();
        match self {
            DriveCommand::Faster => vehicle.set_tangential_velocity(v + steps.linear_step),
            DriveCommand::Slower => vehicle.set_tangential_velocity(v - steps.linear_step),
            DriveCommand::TurnLeft => vehicle.set_angular_velocity(omega + steps.angular_step),
            DriveCommand::TurnRight => vehicle.set_angular_velocity(omega - steps.angular_step),
            DriveCommand::StopLinear => vehicle.set_tangential_velocity(0.0),
            DriveCommand::StopAngular => vehicle.set_angular_velocity(0.0),
            DriveCommand::Halt => {
                vehicle.set_tangential_velocity(0.0);
                vehicle.set_angular_velocity(0.0);
            }
        }
        debug!(
            command = ?self,
            v = vehicle.tangential_velocity(),
            omega = vehicle.angular_velocity(),
            "Applied drive command"
        );
    }
}
