use difdrive_kinematics::*;

fn main() {
    let wheelbase = 0.2;
    let wheel_speed = 1.0; // m/s on both wheels
    let dt = 0.1; // Time step in seconds
    let num_steps = 10;

    match Vehicle::new(wheelbase) {
        Ok(mut vehicle) => {
            println!("Initializing simulation...");
            println!("  Vehicle Geometry:");
            println!("    {}", vehicle.drive());
            println!("  Initial State:");
            println!("    Pose:         {}", vehicle.pose());
            println!("  Simulation Settings:");
            println!("    Time Step:    {} s", dt);
            println!("    Num Steps:    {}", num_steps);
            println!("\nSimulating...");

            vehicle.set_wheel_velocities(WheelVelocities::new(wheel_speed, wheel_speed));
            for i in 0..num_steps {
                if let Err(e) = vehicle.advance(dt) {
                    eprintln!("Error during simulation step {}: {}", i + 1, e);
                    break;
                }
                println!("Step {:>2}: Pose: {}", i + 1, vehicle.pose());
            }

            println!("\nSimulation complete.");
            println!("Final Pose: {:?}", vehicle.pose());
        }
        Err(e) => {
            eprintln!("Failed to initialize vehicle: {}", e);
            eprintln!("Please ensure the wheelbase ({}) is positive.", wheelbase);
        }
    }
}
