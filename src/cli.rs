//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::error::DemoError;
use crate::model::ModelConfig;
use crate::speed::{DEFAULT_SPEED, DEFAULT_SPEED_STEP};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "orbit", version)]
#[command(about = "An orbiting circle and a spinning earth, driven by a reactive clock", long_about = None)]
pub struct Args {
    /// Frames per second
    #[arg(long, value_name = "FPS", default_value_t = 60)]
    pub fps: u32,

    /// Speed multiplier at start-up
    #[arg(long, value_name = "SPEED", default_value_t = DEFAULT_SPEED)]
    pub initial_speed: f64,

    /// Amount each speed button adds or removes
    #[arg(long, value_name = "STEP", default_value_t = DEFAULT_SPEED_STEP)]
    pub speed_step: f64,

    /// Image referenced by the earth element
    #[arg(long, value_name = "PATH", default_value = "earth.png")]
    pub image: String,

    /// Start with the debug overlay shown
    #[arg(long)]
    pub debug: bool,

    /// Write log output to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Render headless and write the final scene as SVG
    #[arg(long, value_name = "PATH")]
    pub export_svg: Option<PathBuf>,

    /// Frames to simulate before exporting
    #[arg(long, value_name = "N", default_value_t = 60, requires = "export_svg")]
    pub frames: u64,

    /// Speed-up clicks applied before exporting
    #[arg(long, value_name = "N", default_value_t = 0, requires = "export_svg")]
    pub speed_ups: u32,

    /// Speed-down clicks applied before exporting
    #[arg(long, value_name = "N", default_value_t = 0, requires = "export_svg")]
    pub speed_downs: u32,
}

/// Headless export settings
#[derive(Clone, Debug, PartialEq)]
pub struct ExportConfig {
    pub path: PathBuf,
    pub frames: u64,
    pub speed_ups: u32,
    pub speed_downs: u32,
}

/// Validated configuration
#[derive(Clone, Debug, PartialEq)]
pub struct DemoConfig {
    pub fps: u32,
    pub model: ModelConfig,
    pub debug: bool,
    pub log_file: Option<PathBuf>,
    pub export: Option<ExportConfig>,
}

impl DemoConfig {
    /// Milliseconds between frames
    pub fn frame_ms(&self) -> f64 {
        1000.0 / self.fps as f64
    }
}

impl Args {
    pub fn into_config(self) -> Result<DemoConfig, DemoError> {
        if self.fps == 0 {
            return Err(DemoError::InvalidConfig(
                "--fps must be greater than zero".to_string(),
            ));
        }
        if !self.initial_speed.is_finite() {
            return Err(DemoError::InvalidConfig(format!(
                "--initial-speed must be finite, got {}",
                self.initial_speed
            )));
        }
        if !self.speed_step.is_finite() {
            return Err(DemoError::InvalidConfig(format!(
                "--speed-step must be finite, got {}",
                self.speed_step
            )));
        }

        let export = self.export_svg.map(|path| ExportConfig {
            path,
            frames: self.frames,
            speed_ups: self.speed_ups,
            speed_downs: self.speed_downs,
        });

        Ok(DemoConfig {
            fps: self.fps,
            model: ModelConfig {
                initial_speed: self.initial_speed,
                speed_step: self.speed_step,
                image: self.image,
            },
            debug: self.debug,
            log_file: self.log_file,
            export,
        })
    }
}
