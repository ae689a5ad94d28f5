//! The driver loop around the kinematics core: which velocities to push into
//! the vehicle, and whether to advance with the fixed or a measured step.

use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use difdrive_kinematics::{KinematicsError, Maneuver, Pose, StepRecord, VelocitySchedule, Vehicle};
use spin_sleep::SpinSleeper;
use tracing::{debug, info, warn};

use crate::config::{ManeuverKind, ManualSettings, Settings};
use crate::control::DriveCommand;
use crate::telemetry::TelemetrySink;

/// Simulated time kept running after the last schedule key (s).
const SCHEDULE_TAIL: f64 = 1.0;
/// Upper bound on fixed steps run for a single rendered frame.
const MAX_STEPS_PER_FRAME: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// A schedule drives the wheels; time advances in fixed steps.
    Scripted,
    /// Drive commands move the vehicle; time advances by measured deltas.
    Manual,
}

/// Owns one vehicle and everything needed to move it forward in time.
#[derive(Debug, Clone)]
pub struct Simulation {
    vehicle: Vehicle,
    schedule: Option<VelocitySchedule>,
    maneuver: Option<Maneuver>,
    mode: Mode,
    step: f64,
    step_counter: u64,
    elapsed: f64,
    accumulator: f64,
}

impl Simulation {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        let vehicle = Vehicle::from_config(&settings.vehicle).context("invalid vehicle parameters")?;
        info!(drive = %vehicle.drive(), step = settings.simulation.step, "Vehicle created");

        let mut sim = Simulation {
            vehicle,
            schedule: None,
            maneuver: None,
            mode: Mode::Manual,
            step: settings.simulation.step,
            step_counter: 0,
            elapsed: 0.0,
            accumulator: 0.0,
        };
        match settings.simulation.maneuver() {
            Some(maneuver) => sim
                .select_maneuver(maneuver)
                .context("invalid maneuver parameters")?,
            None => sim.enter_manual_mode(),
        }
        Ok(sim)
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn maneuver(&self) -> Option<&Maneuver> {
        self.maneuver.as_ref()
    }

    pub fn schedule(&self) -> Option<&VelocitySchedule> {
        self.schedule.as_ref()
    }

    /// Fixed step of the scripted mode (s).
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Simulation time (s): step counter times step when scripted, summed
    /// deltas when manual.
    pub fn time(&self) -> f64 {
        match self.mode {
            Mode::Scripted => self.step_counter as f64 * self.step,
            Mode::Manual => self.elapsed,
        }
    }

    /// Replace the schedule and restart from the origin.
    pub fn select_maneuver(&mut self, maneuver: Maneuver) -> Result<(), KinematicsError> {
        let schedule = maneuver.build(self.vehicle.wheelbase())?;
        info!(
            maneuver = maneuver.name(),
            end = ?schedule.end_time(),
            "Selected maneuver"
        );
        self.schedule = Some(schedule);
        self.maneuver = Some(maneuver);
        self.mode = Mode::Scripted;
        self.reset_position();
        self.reset_timer();
        Ok(())
    }

    /// Drop any schedule and hand the vehicle to drive commands.
    pub fn enter_manual_mode(&mut self) {
        info!("Manual control");
        self.schedule = None;
        self.maneuver = None;
        self.mode = Mode::Manual;
        self.reset_position();
        self.reset_timer();
    }

    /// Apply a drive command; ignored while a schedule is in control.
    pub fn command(&mut self, command: DriveCommand, steps: &ManualSettings) {
        match self.mode {
            Mode::Manual => command.apply(&mut self.vehicle, steps),
            Mode::Scripted => debug!(?command, "Ignoring drive command in scripted mode"),
        }
    }

    /// Back to the origin at rest, with empty trails.
    pub fn reset_position(&mut self) {
        self.vehicle.reset_position();
        self.vehicle.clear_history();
        debug!("Vehicle position reset");
    }

    /// Restart the clock, which restarts any schedule, and empty the trails.
    pub fn reset_timer(&mut self) {
        self.step_counter = 0;
        self.elapsed = 0.0;
        self.accumulator = 0.0;
        self.vehicle.clear_history();
        debug!("Simulation timer reset");
    }

    /// One fixed step: push the scheduled command for the current time, then
    /// advance by the fixed step.
    pub fn tick_fixed(&mut self) -> Result<StepRecord, KinematicsError> {
        let t = self.step_counter as f64 * self.step;
        if let Some(schedule) = &self.schedule {
            schedule.apply(t, &mut self.vehicle);
        }
        self.vehicle.advance(self.step)?;
        self.step_counter += 1;
        Ok(self.vehicle.step_record(self.step, t))
    }

    /// One variable step of a measured `dt`.
    pub fn tick_variable(&mut self, dt: f64) -> Result<StepRecord, KinematicsError> {
        self.vehicle.advance(dt)?;
        self.elapsed += dt;
        Ok(self.vehicle.step_record(dt, self.elapsed))
    }

    /// Advance by one rendered frame of `frame_dt` seconds. Scripted mode runs
    /// as many fixed steps as fit, carrying the remainder to the next frame;
    /// manual mode takes the frame time as a single step.
    pub fn advance_frame(
        &mut self,
        frame_dt: f64,
        sink: &mut dyn TelemetrySink,
    ) -> anyhow::Result<usize> {
        match self.mode {
            Mode::Manual => {
                let record = self.tick_variable(frame_dt)?;
                sink.record(&record)?;
                Ok(1)
            }
            Mode::Scripted => {
                self.accumulator += frame_dt;
                let mut steps = 0;
                while self.accumulator >= self.step && steps < MAX_STEPS_PER_FRAME {
                    let record = self.tick_fixed()?;
                    sink.record(&record)?;
                    self.accumulator -= self.step;
                    steps += 1;
                }
                if self.accumulator >= self.step {
                    warn!(dropped = self.accumulator, "Frame too long, dropping simulation time");
                    self.accumulator = 0.0;
                }
                Ok(steps)
            }
        }
    }

    /// How long a headless run lasts: the configured duration, or the schedule
    /// plus a short tail. Zero without a schedule.
    pub fn headless_duration(&self, configured: f64) -> f64 {
        if configured > 0.0 {
            return configured;
        }
        self.schedule
            .as_ref()
            .and_then(VelocitySchedule::end_time)
            .map_or(0.0, |end| end + SCHEDULE_TAIL)
    }
}

/// Outcome of a headless run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub steps: u64,
    pub simulated_time: f64,
    pub final_pose: Pose,
}

/// Run the configured simulation to completion without a window, one
/// telemetry record per step.
///
/// Manual driving needs keyboard input, so a `manual` maneuver is rejected.
pub fn run_headless(settings: &Settings, sink: &mut dyn TelemetrySink) -> anyhow::Result<RunSummary> {
    if settings.simulation.maneuver == ManeuverKind::Manual {
        bail!("maneuver 'manual' needs the viewer; choose vector, rectangle, curve or commands");
    }
    let mut sim = Simulation::new(settings)?;
    let duration = sim.headless_duration(settings.simulation.duration);
    // Nearest whole step; the ratio is rarely an exact integer in floating point.
    let steps = (duration / sim.step()).round() as u64;
    info!(duration, steps, realtime = settings.simulation.realtime, "Headless run started");

    let sleeper = SpinSleeper::new(10_000);
    let started = Instant::now();
    let mut overruns = 0u64;

    for i in 0..steps {
        let record = sim
            .tick_fixed()
            .with_context(|| format!("simulation step {} failed", i + 1))?;
        sink.record(&record)?;

        if settings.simulation.realtime {
            let deadline = started + Duration::from_secs_f64((i + 1) as f64 * sim.step());
            let now = Instant::now();
            if now < deadline {
                sleeper.sleep(deadline - now);
            } else {
                overruns += 1;
            }
        }
    }
    sink.flush()?;

    if overruns > 0 {
        warn!(overruns, "Realtime pacing fell behind");
    }
    let summary = RunSummary {
        steps,
        simulated_time: sim.time(),
        final_pose: sim.vehicle().pose(),
    };
    info!(
        steps = summary.steps,
        t = summary.simulated_time,
        pose = %summary.final_pose,
        "Headless run complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandEntry;
    use crate::telemetry::{LineSink, NullSink};
    use std::f64::consts::PI;
    const EPSILON: f64 = 1e-6;

    fn settings_for(maneuver: ManeuverKind) -> Settings {
        let mut settings = Settings::default();
        settings.simulation.maneuver = maneuver;
        settings
    }

    #[test]
    fn test_new_rejects_bad_vehicle() {
        let mut settings = settings_for(ManeuverKind::Vector);
        settings.vehicle.wheelbase = 0.0;
        assert!(Simulation::new(&settings).is_err());

        let mut settings = settings_for(ManeuverKind::Rectangle);
        settings.simulation.rectangle_side = f64::NAN;
        assert!(Simulation::new(&settings).is_err());
    }

    #[test]
    fn test_scripted_time_follows_step_counter() {
        let mut sim = Simulation::new(&settings_for(ManeuverKind::Vector)).unwrap();
        assert_eq!(sim.mode(), Mode::Scripted);
        let first = sim.tick_fixed().unwrap();
        assert_eq!(first.t, 0.0);
        // The first key is at t = 0 and commands 2 m/s on both wheels.
        assert!((first.v_left - 2.0).abs() < EPSILON);
        for _ in 0..199 {
            sim.tick_fixed().unwrap();
        }
        assert!((sim.time() - 1.0).abs() < EPSILON);
        assert!((sim.vehicle().pose().x - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_select_maneuver_resets_vehicle_and_clock() {
        let mut sim = Simulation::new(&settings_for(ManeuverKind::Vector)).unwrap();
        for _ in 0..50 {
            sim.tick_fixed().unwrap();
        }
        sim.select_maneuver(Maneuver::Rectangle { side_length: 2.0 }).unwrap();
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.vehicle().pose(), Pose::default());
        assert!(sim.vehicle().history().is_empty());
        assert_eq!(sim.maneuver().map(Maneuver::name), Some("rectangle"));
    }

    #[test]
    fn test_manual_mode_commands_and_variable_step() {
        let mut sim = Simulation::new(&settings_for(ManeuverKind::Manual)).unwrap();
        assert_eq!(sim.mode(), Mode::Manual);
        let steps = ManualSettings::default();
        for _ in 0..10 {
            sim.command(DriveCommand::Faster, &steps);
        }
        sim.tick_variable(0.25).unwrap();
        sim.tick_variable(0.75).unwrap();
        assert!((sim.time() - 1.0).abs() < EPSILON);
        assert!((sim.vehicle().pose().x - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_commands_ignored_while_scripted() {
        let mut sim = Simulation::new(&settings_for(ManeuverKind::Vector)).unwrap();
        sim.command(DriveCommand::Faster, &ManualSettings::default());
        assert_eq!(sim.vehicle().tangential_velocity(), 0.0);
    }

    #[test]
    fn test_advance_frame_carries_remainder() {
        let mut sim = Simulation::new(&settings_for(ManeuverKind::Vector)).unwrap();
        let mut sink = NullSink;
        assert_eq!(sim.advance_frame(0.012, &mut sink).unwrap(), 2);
        assert_eq!(sim.advance_frame(0.004, &mut sink).unwrap(), 1);
        assert_eq!(sim.advance_frame(0.0, &mut sink).unwrap(), 0);
    }

    #[test]
    fn test_headless_duration() {
        let sim = Simulation::new(&settings_for(ManeuverKind::Rectangle)).unwrap();
        assert_eq!(sim.headless_duration(0.0), 9.0);
        assert_eq!(sim.headless_duration(3.0), 3.0);
        let manual = Simulation::new(&settings_for(ManeuverKind::Manual)).unwrap();
        assert_eq!(manual.headless_duration(0.0), 0.0);
    }

    #[test]
    fn test_run_headless_rejects_manual_mode() {
        let mut sink = LineSink::new(Vec::new());
        let result = run_headless(&settings_for(ManeuverKind::Manual), &mut sink);
        assert!(result.is_err());
        assert!(sink.into_inner().is_empty());
    }

    #[test]
    fn test_run_headless_rectangle() {
        let mut sink = NullSink;
        let summary = run_headless(&settings_for(ManeuverKind::Rectangle), &mut sink).unwrap();
        assert_eq!(summary.steps, 1800);
        assert!((summary.final_pose.theta - 2.0 * PI).abs() < 0.05);
        assert!(summary.final_pose.x.abs() < 0.05);
        assert!(summary.final_pose.y.abs() < 0.05);
    }

    #[test]
    fn test_run_headless_commands_emit_one_line_per_step() {
        let mut settings = settings_for(ManeuverKind::Commands);
        settings.simulation.step = 0.1;
        settings.simulation.duration = 1.0;
        settings.simulation.commands = vec![
            CommandEntry { time: 0.0, left: 1.0, right: 1.0 },
            CommandEntry { time: 0.5, left: -1.0, right: 1.0 },
        ];
        let mut sink = LineSink::new(Vec::new());
        let summary = run_headless(&settings, &mut sink).unwrap();
        assert_eq!(summary.steps, 10);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 10);
        // Five straight steps at 1 m/s, then pivoting in place.
        assert!((summary.final_pose.x - 0.5).abs() < EPSILON);
        assert!((summary.final_pose.theta - 5.0 * 10.0 * 0.1).abs() < EPSILON);
    }

    #[test]
    fn test_run_headless_rejects_unordered_commands() {
        let mut settings = settings_for(ManeuverKind::Commands);
        settings.simulation.commands = vec![
            CommandEntry { time: 1.0, left: 1.0, right: 1.0 },
            CommandEntry { time: 0.5, left: 0.0, right: 0.0 },
        ];
        assert!(run_headless(&settings, &mut NullSink).is_err());
    }
}
