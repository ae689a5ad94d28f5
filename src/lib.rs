//! Simulation driver around `difdrive-kinematics`: layered settings, the
//! scripted and manual loops, telemetry sinks and the macroquad viewer.

pub mod config;
pub mod control;
pub mod graphics;
pub mod logging;
pub mod simulation;
pub mod telemetry;
