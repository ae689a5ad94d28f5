//! Layered settings: built-in defaults, `config/default.toml`, `DIFDRIVE__*`
//! environment variables, then command-line overrides.

use std::path::Path;
use std::str::FromStr;

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use anyhow::{Context, bail};
use difdrive_kinematics::{Maneuver, VehicleConfig};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "DIFDRIVE";

/// Fixed simulation step of the scripted mode: 200 steps per simulated second.
pub const DEFAULT_STEP: f64 = 0.005;

/// Everything the driver needs, owned by the caller and passed by reference.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub vehicle: VehicleConfig,
    pub simulation: SimulationSettings,
    pub telemetry: TelemetrySettings,
    pub manual: ManualSettings,
    pub viewer: ViewerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Fixed step of the scripted mode (s).
    pub step: f64,
    /// Simulated time to run headless (s); `0` derives it from the schedule.
    pub duration: f64,
    /// Pace the headless loop against the wall clock.
    pub realtime: bool,
    pub maneuver: ManeuverKind,
    pub rectangle_side: f64,
    pub curve: CurveSettings,
    pub commands: Vec<CommandEntry>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            step: DEFAULT_STEP,
            duration: 0.0,
            realtime: false,
            maneuver: ManeuverKind::Rectangle,
            rectangle_side: 1.0,
            curve: CurveSettings::default(),
            commands: Vec::new(),
        }
    }
}

impl SimulationSettings {
    /// The maneuver to replay, or `None` for manual driving.
    pub fn maneuver(&self) -> Option<Maneuver> {
        match self.maneuver {
            ManeuverKind::Vector => Some(Maneuver::Vector),
            ManeuverKind::Rectangle => Some(Maneuver::Rectangle {
                side_length: self.rectangle_side,
            }),
            ManeuverKind::Curve => Some(Maneuver::Curve {
                first_radius: self.curve.first_radius,
                straight_length: self.curve.straight,
                second_radius: self.curve.second_radius,
            }),
            ManeuverKind::Commands => Some(Maneuver::Custom {
                left: self.commands.iter().map(|c| (c.time, c.left)).collect(),
                right: self.commands.iter().map(|c| (c.time, c.right)).collect(),
            }),
            ManeuverKind::Manual => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManeuverKind {
    Vector,
    Rectangle,
    Curve,
    Commands,
    Manual,
}

impl FromStr for ManeuverKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vector" => Ok(ManeuverKind::Vector),
            "rectangle" | "square" => Ok(ManeuverKind::Rectangle),
            "curve" => Ok(ManeuverKind::Curve),
            "commands" => Ok(ManeuverKind::Commands),
            "manual" => Ok(ManeuverKind::Manual),
            other => bail!("unknown maneuver '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveSettings {
    pub first_radius: f64,
    pub straight: f64,
    pub second_radius: f64,
}

impl Default for CurveSettings {
    fn default() -> Self {
        CurveSettings {
            first_radius: 0.5,
            straight: 1.0,
            second_radius: 0.5,
        }
    }
}

/// One row of a hand-written command table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommandEntry {
    pub time: f64,
    pub left: f64,
    pub right: f64,
}

impl FromStr for CommandEntry {
    type Err = anyhow::Error;

    /// Parses `time,left,right`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s
            .split(',')
            .map(|f| f.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("invalid command '{}'", s))?;
        match fields.as_slice() {
            [time, left, right] => Ok(CommandEntry {
                time: *time,
                left: *left,
                right: *right,
            }),
            _ => bail!("command '{}' must be time,left,right", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Stdout,
    Tracing,
    #[serde(rename = "none")]
    Disabled,
}

impl FromStr for SinkKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stdout" => Ok(SinkKind::Stdout),
            "tracing" => Ok(SinkKind::Tracing),
            "none" => Ok(SinkKind::Disabled),
            other => bail!("unknown telemetry sink '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    pub sink: SinkKind,
}

/// Increments applied by one manual drive command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualSettings {
    /// Linear velocity change per command (m/s).
    pub linear_step: f64,
    /// Angular velocity change per command (rad/s).
    pub angular_step: f64,
}

impl Default for ManualSettings {
    fn default() -> Self {
        ManualSettings {
            linear_step: 0.1,
            angular_step: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Pixels per metre at zoom 1.
    pub scale: f32,
    pub theme: Theme,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        ViewerSettings {
            scale: 100.0,
            theme: Theme::Dark,
        }
    }
}

impl Settings {
    /// Reject values the simulation loop cannot run with. Vehicle geometry is
    /// checked when the vehicle is built.
    pub fn validate(&self) -> anyhow::Result<()> {
        let sim = &self.simulation;
        if !(sim.step > 0.0 && sim.step.is_finite()) {
            bail!("simulation step must be positive, got {}", sim.step);
        }
        if !(sim.duration >= 0.0 && sim.duration.is_finite()) {
            bail!("simulation duration must be non-negative, got {}", sim.duration);
        }
        if sim.maneuver == ManeuverKind::Commands && sim.commands.is_empty() {
            bail!("maneuver 'commands' needs at least one command");
        }
        Ok(())
    }
}

/// The file and environment layers. `path` replaces the default file and must
/// exist; the default file is optional.
pub fn builder(path: Option<&Path>) -> ConfigBuilder<DefaultState> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(false),
    };
    Config::builder().add_source(file).add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}

/// Build the layered configuration and deserialize it into [`Settings`].
pub fn load_settings(builder: ConfigBuilder<DefaultState>) -> Result<Settings, ConfigError> {
    let settings = builder.build().and_then(|config| config.try_deserialize::<Settings>());

    match settings {
        Ok(settings) => {
            info!(?settings, "Successfully loaded configuration");
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str) -> Settings {
        let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        load_settings(builder).unwrap()
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let settings = from_toml("");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.simulation.step, DEFAULT_STEP);
        assert_eq!(settings.vehicle.wheelbase, 0.2);
        assert_eq!(settings.telemetry.sink, SinkKind::Stdout);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let settings = from_toml(
            r#"
            [vehicle]
            wheelbase = 0.3

            [simulation]
            maneuver = "curve"

            [simulation.curve]
            straight = 2.5

            [telemetry]
            sink = "none"
            "#,
        );
        assert_eq!(settings.vehicle.wheelbase, 0.3);
        assert_eq!(settings.vehicle.wheel_radius, 0.05);
        assert_eq!(settings.telemetry.sink, SinkKind::Disabled);
        assert_eq!(
            settings.simulation.maneuver(),
            Some(Maneuver::Curve {
                first_radius: 0.5,
                straight_length: 2.5,
                second_radius: 0.5,
            })
        );
    }

    #[test]
    fn test_command_table() {
        let settings = from_toml(
            r#"
            [simulation]
            maneuver = "commands"

            [[simulation.commands]]
            time = 0.0
            left = 1.0
            right = 1.0

            [[simulation.commands]]
            time = 2.0
            left = -1.0
            right = 1.0
            "#,
        );
        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.simulation.maneuver(),
            Some(Maneuver::Custom {
                left: vec![(0.0, 1.0), (2.0, -1.0)],
                right: vec![(0.0, 1.0), (2.0, 1.0)],
            })
        );
    }

    #[test]
    fn test_overrides_win() {
        let builder = Config::builder()
            .add_source(File::from_str("[vehicle]\nwheelbase = 0.3", FileFormat::Toml))
            .set_override_option("vehicle.wheelbase", Some(0.4))
            .unwrap()
            .set_override_option("simulation.step", None::<f64>)
            .unwrap();
        let settings = load_settings(builder).unwrap();
        assert_eq!(settings.vehicle.wheelbase, 0.4);
        assert_eq!(settings.simulation.step, DEFAULT_STEP);
    }

    #[test]
    fn test_unknown_maneuver_is_rejected() {
        let builder = Config::builder()
            .add_source(File::from_str("[simulation]\nmaneuver = \"zigzag\"", FileFormat::Toml));
        assert!(load_settings(builder).is_err());
    }

    #[test]
    fn test_validate() {
        let mut settings = Settings::default();
        settings.simulation.step = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.simulation.maneuver = ManeuverKind::Commands;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_parse_cli_values() {
        let command: CommandEntry = "1.5, -0.2, 0.2".parse().unwrap();
        assert_eq!(command, CommandEntry { time: 1.5, left: -0.2, right: 0.2 });
        assert!("1.5,0.2".parse::<CommandEntry>().is_err());
        assert!("a,b,c".parse::<CommandEntry>().is_err());

        assert_eq!("Square".parse::<ManeuverKind>().unwrap(), ManeuverKind::Rectangle);
        assert!("zigzag".parse::<ManeuverKind>().is_err());
        assert_eq!("none".parse::<SinkKind>().unwrap(), SinkKind::Disabled);
    }
}
