use std::path::PathBuf;

use anyhow::Context;
use difdrive::config::{self, CommandEntry, ManeuverKind, SinkKind};
use difdrive::logging;
use difdrive::simulation::run_headless;
use difdrive::telemetry::sink_for;
use structopt::StructOpt;
use tracing::info;

/// Replay a differential-drive maneuver headless and print one diagnostic
/// line per simulation step.
#[derive(Debug, StructOpt)]
#[structopt(name = "difdrive")]
struct Opt {
    /// Configuration file, replacing `config/default.toml`.
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Distance between the wheels (m).
    #[structopt(long)]
    wheelbase: Option<f64>,

    /// Wheel radius (m).
    #[structopt(long)]
    wheel_radius: Option<f64>,

    /// Fixed simulation step (s).
    #[structopt(long)]
    step: Option<f64>,

    /// Simulated time to run (s); 0 runs until the schedule ends.
    #[structopt(short, long)]
    duration: Option<f64>,

    /// One of vector, rectangle, curve, commands (manual is viewer-only).
    #[structopt(short, long)]
    maneuver: Option<ManeuverKind>,

    /// Side length of the rectangle maneuver (m).
    #[structopt(long)]
    side: Option<f64>,

    /// A `time,left,right` wheel velocity key; repeat for a table. Implies
    /// `--maneuver commands`.
    #[structopt(long = "command", number_of_values = 1, allow_hyphen_values = true)]
    commands: Vec<CommandEntry>,

    /// Pace the run against the wall clock.
    #[structopt(long)]
    realtime: bool,

    /// Where step records go: stdout, tracing or none.
    #[structopt(long)]
    sink: Option<SinkKind>,
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let opt = Opt::from_args();

    let builder = config::builder(opt.config.as_deref())
        .set_override_option("vehicle.wheelbase", opt.wheelbase)?
        .set_override_option("vehicle.wheel_radius", opt.wheel_radius)?
        .set_override_option("simulation.step", opt.step)?
        .set_override_option("simulation.duration", opt.duration)?
        .set_override_option("simulation.rectangle_side", opt.side)?
        .set_override_option("simulation.realtime", opt.realtime.then_some(true))?;
    let mut settings = config::load_settings(builder).context("could not load configuration")?;

    if let Some(maneuver) = opt.maneuver {
        settings.simulation.maneuver = maneuver;
    }
    if !opt.commands.is_empty() {
        settings.simulation.commands = opt.commands;
        settings.simulation.maneuver = ManeuverKind::Commands;
    }
    if let Some(sink) = opt.sink {
        settings.telemetry.sink = sink;
    }

    let mut sink = sink_for(settings.telemetry.sink);
    let summary = run_headless(&settings, sink.as_mut())?;
    info!(pose = %summary.final_pose, "Done");
    Ok(())
}
