use clap::Parser;
use std::path::PathBuf;

use crate::config::{ConfigError, TaskConfig};

/// Visuomotor rotation task: point at targets with a joystick, with and
/// without rotated cursor feedback.
#[derive(Parser, Debug)]
#[command(name = "visuomotor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Task config (TOML). Defaults to baseline/rotation/aftereffect.
    #[arg(short, long, conflicts_with = "single_block")]
    pub config: Option<PathBuf>,

    /// Run the plain 20-trial pointing task without rotation.
    #[arg(long)]
    pub single_block: bool,

    /// Seed for the target order, for reproducible sessions.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Print the effective config as TOML and exit.
    #[arg(long)]
    pub dump_config: bool,

    /// Write the effective config to this file and exit.
    #[arg(long, value_name = "PATH")]
    pub save_config: Option<PathBuf>,

    /// Log every trial phase change.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn task_config(&self) -> Result<TaskConfig, ConfigError> {
        match &self.config {
            Some(path) => TaskConfig::load(path),
            None if self.single_block => Ok(TaskConfig::single_block()),
            None => Ok(TaskConfig::default()),
        }
    }
}
