use difdrive_kinematics::*;

/// Replays the square preset at the fixed 200 Hz step and prints one
/// diagnostic line per simulated tenth of a second.
fn main() -> Result<(), KinematicsError> {
    let dt = 0.005;
    let mut vehicle = Vehicle::from_config(&VehicleConfig::default())?;
    let schedule = VelocitySchedule::rectangle(1.0, vehicle.wheelbase())?;
    let end = schedule.end_time().unwrap_or(0.0) + 1.0;

    let mut step: u64 = 0;
    loop {
        let t = step as f64 * dt;
        if t > end {
            break;
        }
        schedule.apply(t, &mut vehicle);
        vehicle.advance(dt)?;
        if step % 20 == 0 {
            println!("{}", vehicle.step_record(dt, t));
        }
        step += 1;
    }

    let pose = vehicle.pose();
    println!(
        "\nFinal pose: {} (heading {:.2} deg, wrapped {:.2} deg)",
        pose,
        rad_to_deg(pose.theta),
        rad_to_deg(normalize_angle(pose.theta))
    );
    Ok(())
}
