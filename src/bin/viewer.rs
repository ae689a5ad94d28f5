use std::path::PathBuf;

use anyhow::Context;
use difdrive::config::{self, Settings, Theme};
use difdrive::control::DriveCommand;
use difdrive::graphics::{ViewSettings, draw_scene, window_conf};
use difdrive::logging;
use difdrive::simulation::{Mode, Simulation};
use difdrive::telemetry::sink_for;
use difdrive_kinematics::Maneuver;
use macroquad::prelude::*;
use structopt::StructOpt;
use tracing::{error, info};

/// Interactive differential-drive viewer.
#[derive(Debug, StructOpt)]
#[structopt(name = "difdrive-viewer")]
struct Opt {
    /// Configuration file, replacing `config/default.toml`.
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,
}

const DRIVE_KEYS: [(KeyCode, DriveCommand); 7] = [
    (KeyCode::W, DriveCommand::Faster),
    (KeyCode::S, DriveCommand::Slower),
    (KeyCode::A, DriveCommand::TurnLeft),
    (KeyCode::D, DriveCommand::TurnRight),
    (KeyCode::Q, DriveCommand::StopLinear),
    (KeyCode::R, DriveCommand::StopAngular),
    (KeyCode::Space, DriveCommand::Halt),
];

#[macroquad::main(window_conf)]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        error!("Viewer stopped: {:?}", e);
    }
}

async fn run() -> anyhow::Result<()> {
    let opt = Opt::from_args();
    let settings = config::load_settings(config::builder(opt.config.as_deref()))
        .context("could not load configuration")?;
    let mut sim = Simulation::new(&settings)?;
    let mut sink = sink_for(settings.telemetry.sink);
    let mut view = ViewSettings::new(&settings.viewer);
    info!("Viewer started");

    loop {
        handle_input(&mut sim, &mut view, &settings)?;
        sim.advance_frame(get_frame_time() as f64, sink.as_mut())?;
        draw_scene(&sim, &view);
        next_frame().await
    }
}

fn handle_input(sim: &mut Simulation, view: &mut ViewSettings, settings: &Settings) -> anyhow::Result<()> {
    let maneuvers = [
        (KeyCode::Key1, Maneuver::Vector),
        (
            KeyCode::Key2,
            Maneuver::Rectangle {
                side_length: settings.simulation.rectangle_side,
            },
        ),
        (
            KeyCode::Key3,
            Maneuver::Curve {
                first_radius: settings.simulation.curve.first_radius,
                straight_length: settings.simulation.curve.straight,
                second_radius: settings.simulation.curve.second_radius,
            },
        ),
    ];
    for (key, maneuver) in maneuvers {
        if is_key_pressed(key) {
            sim.select_maneuver(maneuver)?;
        }
    }
    if is_key_pressed(KeyCode::M) && sim.mode() != Mode::Manual {
        sim.enter_manual_mode();
    }

    for (key, command) in DRIVE_KEYS {
        if is_key_pressed(key) {
            sim.command(command, &settings.manual);
        }
    }

    if is_key_pressed(KeyCode::P) {
        sim.reset_position();
    }
    if is_key_pressed(KeyCode::T) {
        sim.reset_timer();
    }
    if is_key_pressed(KeyCode::L) {
        view.theme = Theme::Light;
    }
    if is_key_pressed(KeyCode::K) {
        view.theme = Theme::Dark;
    }

    let (_, wheel_y) = mouse_wheel();
    view.zoom_by(wheel_y);
    Ok(())
}
