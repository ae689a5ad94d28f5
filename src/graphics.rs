use macroquad::prelude::*;

use difdrive_kinematics::{Point2, Trail};

use crate::config::{Theme, ViewerSettings};
use crate::simulation::{Mode, Simulation};

const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 20.0;
const ZOOM_FACTOR: f32 = 1.1;
/// Grid spacing (m).
const GRID_SPACING: f32 = 0.5;

// Function to configure the macroquad window
pub fn window_conf() -> Conf {
    Conf {
        window_title: "Differential Drive".to_string(),
        window_width: 1000,
        window_height: 800,
        high_dpi: true,
        ..Default::default()
    }
}

pub struct Palette {
    pub background: Color,
    pub grid: Color,
    pub body: Color,
    pub heading: Color,
    pub wheel: Color,
    pub trail: Color,
    pub wheel_trail: Color,
    pub icr: Color,
    pub text: Color,
}

impl Theme {
    pub fn palette(self) -> Palette {
        match self {
            Theme::Dark => Palette {
                background: Color::new(0.08, 0.08, 0.10, 1.0),
                grid: Color::new(0.25, 0.25, 0.28, 1.0),
                body: SKYBLUE,
                heading: WHITE,
                wheel: LIGHTGRAY,
                trail: YELLOW,
                wheel_trail: ORANGE,
                icr: RED,
                text: WHITE,
            },
            Theme::Light => Palette {
                background: WHITE,
                grid: LIGHTGRAY,
                body: BLUE,
                heading: DARKBLUE,
                wheel: DARKGRAY,
                trail: DARKGREEN,
                wheel_trail: GREEN,
                icr: RED,
                text: BLACK,
            },
        }
    }
}

/// Per-window view state, owned by the render loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    /// Pixels per metre at zoom 1.
    pub scale: f32,
    pub zoom: f32,
    pub theme: Theme,
}

impl ViewSettings {
    pub fn new(settings: &ViewerSettings) -> Self {
        ViewSettings {
            scale: settings.scale,
            zoom: 1.0,
            theme: settings.theme,
        }
    }

    pub fn pixels_per_metre(&self) -> f32 {
        self.scale * self.zoom
    }

    /// Zoom in for a positive wheel delta, out for a negative one.
    pub fn zoom_by(&mut self, wheel_delta: f32) {
        if wheel_delta > 0.0 {
            self.zoom = (self.zoom * ZOOM_FACTOR).min(MAX_ZOOM);
        } else if wheel_delta < 0.0 {
            self.zoom = (self.zoom / ZOOM_FACTOR).max(MIN_ZOOM);
        }
    }
}

/// World metres to screen pixels, world origin at `origin` and y up.
pub fn world_to_screen(point: Point2, origin: Vec2, pixels_per_metre: f32) -> Vec2 {
    vec2(
        origin.x + point.x as f32 * pixels_per_metre,
        origin.y - point.y as f32 * pixels_per_metre,
    )
}

fn draw_grid(origin: Vec2, ppm: f32, color: Color) {
    let step = GRID_SPACING * ppm;
    if step < 4.0 {
        return;
    }
    let mut x = origin.x.rem_euclid(step);
    while x < screen_width() {
        draw_line(x, 0.0, x, screen_height(), 1.0, color);
        x += step;
    }
    let mut y = origin.y.rem_euclid(step);
    while y < screen_height() {
        draw_line(0.0, y, screen_width(), y, 1.0, color);
        y += step;
    }
    draw_line(origin.x, 0.0, origin.x, screen_height(), 2.0, color);
    draw_line(0.0, origin.y, screen_width(), origin.y, 2.0, color);
}

fn draw_trail(trail: &Trail, origin: Vec2, ppm: f32, color: Color) {
    let points: Vec<Vec2> = trail.iter().map(|p| world_to_screen(*p, origin, ppm)).collect();
    for pair in points.windows(2) {
        draw_line(pair[0].x, pair[0].y, pair[1].x, pair[1].y, 2.0, color);
    }
}

/// Draw one frame of the simulation: grid, trails, body, wheels, ICR and HUD.
pub fn draw_scene(sim: &Simulation, view: &ViewSettings) {
    let palette = view.theme.palette();
    let ppm = view.pixels_per_metre();
    let origin = vec2(screen_width() / 2.0, screen_height() / 2.0);
    let vehicle = sim.vehicle();
    let pose = vehicle.pose();

    clear_background(palette.background);
    draw_grid(origin, ppm, palette.grid);

    draw_trail(vehicle.history(), origin, ppm, palette.trail);
    draw_trail(vehicle.left_wheel().history(), origin, ppm, palette.wheel_trail);
    draw_trail(vehicle.right_wheel().history(), origin, ppm, palette.wheel_trail);

    let centre = world_to_screen(pose.position(), origin, ppm);
    let body_radius = (vehicle.wheelbase() as f32 / 2.0 * ppm).max(3.0);
    draw_circle_lines(centre.x, centre.y, body_radius, 2.0, palette.body);

    // Screen y points down, so the heading flips sign.
    let (sin, cos) = (-pose.theta as f32).sin_cos();
    draw_line(
        centre.x,
        centre.y,
        centre.x + body_radius * cos,
        centre.y + body_radius * sin,
        2.0,
        palette.heading,
    );

    let half_tyre = (vehicle.drive().wheel_radius() as f32 * ppm).max(2.0);
    for wheel in [vehicle.left_wheel(), vehicle.right_wheel()] {
        let at = world_to_screen(wheel.position(), origin, ppm);
        draw_line(
            at.x - half_tyre * cos,
            at.y - half_tyre * sin,
            at.x + half_tyre * cos,
            at.y + half_tyre * sin,
            4.0,
            palette.wheel,
        );
    }

    if let Some(icr) = vehicle.icr_point() {
        let at = world_to_screen(icr, origin, ppm);
        draw_circle(at.x, at.y, 4.0, palette.icr);
        draw_line(centre.x, centre.y, at.x, at.y, 1.0, palette.icr);
    }

    draw_hud(sim, view, &palette);
}

fn draw_hud(sim: &Simulation, view: &ViewSettings, palette: &Palette) {
    let vehicle = sim.vehicle();
    let pose = vehicle.pose();
    let wheels = vehicle.wheel_velocities();
    let mode = match (sim.mode(), sim.maneuver()) {
        (Mode::Manual, _) => "manual",
        (Mode::Scripted, Some(maneuver)) => maneuver.name(),
        (Mode::Scripted, None) => "scripted",
    };
    let icr = match vehicle.icr_radius() {
        Some(r) => format!("{:.3} m", r),
        None => "inf".to_string(),
    };

    let lines = [
        format!("mode: {}   t = {:.3} s   zoom = {:.2}", mode, sim.time(), view.zoom),
        format!("x = {:.3}  y = {:.3}  theta = {:.3}", pose.x, pose.y, pose.theta),
        format!(
            "v = {:.3} m/s  omega = {:.3} rad/s  icr = {}",
            vehicle.tangential_velocity(),
            vehicle.angular_velocity(),
            icr
        ),
        format!("v_l = {:.3}  v_r = {:.3}", wheels.left, wheels.right),
        "1/2/3 maneuver  M manual  WASD/Q/R/Space drive  P/T reset  L/K theme".to_string(),
    ];
    for (i, line) in lines.iter().enumerate() {
        draw_text(line, 10.0, 20.0 + 20.0 * i as f32, 20.0, palette.text);
    }
}
