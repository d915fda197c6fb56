use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, path::Path, time::Duration};

use crate::util::TargetRing;

#[derive(Debug)]
pub enum ConfigError {
    /// Couldn't read or write the config file.
    Io(std::io::Error),
    /// The file isn't valid TOML for a task config.
    Parse(toml::de::Error),
    /// Couldn't serialize the config.
    Serialize(toml::ser::Error),
    /// The values parsed but don't describe a runnable task.
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "config I/O failure: {}", err),
            ConfigError::Parse(err) => write!(f, "config parse failure: {}", err),
            ConfigError::Serialize(err) => write!(f, "config serialization failure: {}", err),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Serialize(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self { ConfigError::Io(err) }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self { ConfigError::Parse(err) }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self { ConfigError::Serialize(err) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Baseline,
    Rotated,
    Aftereffect,
}

impl BlockKind {
    /// Numeric condition tag used in trial logs.
    pub fn tag(self) -> u8 {
        match self {
            BlockKind::Baseline => 1,
            BlockKind::Rotated => 2,
            BlockKind::Aftereffect => 3,
        }
    }
}

impl Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKind::Baseline => write!(f, "Baseline"),
            BlockKind::Rotated => write!(f, "Rotation"),
            BlockKind::Aftereffect => write!(f, "Aftereffect"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub trials: usize,
    /// Cursor rotation in degrees. Only rotated blocks carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_degrees: Option<f32>,
}

impl Block {
    pub fn baseline(trials: usize) -> Self { Self { kind: BlockKind::Baseline, trials, rotation_degrees: None } }

    pub fn rotated(trials: usize, degrees: f32) -> Self {
        Self { kind: BlockKind::Rotated, trials, rotation_degrees: Some(degrees) }
    }

    pub fn aftereffect(trials: usize) -> Self { Self { kind: BlockKind::Aftereffect, trials, rotation_degrees: None } }
}

/// Logical screen, in the same units as every position the task computes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: f32,
    pub height: f32,
    pub start_radius: f32,
    pub target_radius: f32,
    pub bullseye_radius: f32,
    pub cursor_radius: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 800.0,
            start_radius: 25.0,
            target_radius: 20.0,
            bullseye_radius: 15.0,
            cursor_radius: 10.0,
        }
    }
}

impl DisplayConfig {
    pub fn center(&self) -> Point2<f32> { Point2::new((self.width / 2.0).floor(), (self.height / 2.0).floor()) }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub count: usize,
    pub distance: f32,
}

impl Default for TargetConfig {
    fn default() -> Self { Self { count: 8, distance: 200.0 } }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Per-tick cursor displacement that counts as movement onset.
    pub speed_threshold: f32,
    pub freeze_window_ms: u64,
    pub inter_trial_delay_ms: u64,
    /// Give up on a trial that never starts moving. `None` waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement_timeout_ms: Option<u64>,
    pub poll_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            speed_threshold: 1.0,
            freeze_window_ms: 100,
            inter_trial_delay_ms: 1500,
            movement_timeout_ms: Some(5000),
            poll_interval_ms: 5,
        }
    }
}

impl TimingConfig {
    pub fn freeze_window(&self) -> Duration { Duration::from_millis(self.freeze_window_ms) }

    pub fn inter_trial_delay(&self) -> Duration { Duration::from_millis(self.inter_trial_delay_ms) }

    pub fn movement_timeout(&self) -> Option<Duration> { self.movement_timeout_ms.map(Duration::from_millis) }

    pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.poll_interval_ms) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Reduce directional errors to [0°, 180°].
    #[serde(default = "default_wrap_error")]
    pub wrap_error: bool,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub targets: TargetConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    pub blocks: Vec<Block>,
}

fn default_wrap_error() -> bool { true }

impl Default for TaskConfig {
    /// Baseline, counterclockwise rotation, then aftereffect.
    fn default() -> Self {
        Self {
            wrap_error: true,
            display: DisplayConfig::default(),
            targets: TargetConfig::default(),
            timing: TimingConfig::default(),
            blocks: vec![Block::baseline(20), Block::rotated(60, -45.0), Block::aftereffect(20)],
        }
    }
}

impl TaskConfig {
    /// Plain pointing task: one baseline block, shorter pause between trials.
    pub fn single_block() -> Self {
        let mut config = Self { blocks: vec![Block::baseline(20)], ..Self::default() };
        config.timing.inter_trial_delay_ms = 1000;
        config
    }

    pub fn ring(&self) -> TargetRing { TargetRing::new(self.targets.count, self.targets.distance, self.display.center()) }

    pub fn total_trials(&self) -> usize { self.blocks.iter().map(|b| b.trials).sum() }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        let d = &self.display;
        if !(d.width > 0.0 && d.height > 0.0) {
            return invalid(format!("display must have a positive size, got {}x{}", d.width, d.height));
        }
        if self.targets.count < 3 {
            return invalid(format!("need at least 3 targets, got {}", self.targets.count));
        }
        if !(self.targets.distance > 0.0) {
            return invalid(format!("target distance must be > 0, got {}", self.targets.distance));
        }
        if !(self.timing.speed_threshold >= 0.0) {
            return invalid(format!("speed_threshold must be >= 0, got {}", self.timing.speed_threshold));
        }
        if self.timing.poll_interval_ms == 0 {
            return invalid("poll_interval_ms must be > 0".to_string());
        }
        if self.blocks.is_empty() {
            return invalid("at least one block is required".to_string());
        }
        for (i, block) in self.blocks.iter().enumerate() {
            if block.trials == 0 {
                return invalid(format!("block {} ({}) has no trials", i + 1, block.kind));
            }
            match (block.kind, block.rotation_degrees) {
                (BlockKind::Rotated, None) => {
                    return invalid(format!("block {} is rotated but has no rotation_degrees", i + 1));
                }
                (BlockKind::Rotated, Some(angle)) if !angle.is_finite() => {
                    return invalid(format!("block {} rotation must be finite", i + 1));
                }
                (BlockKind::Baseline | BlockKind::Aftereffect, Some(_)) => {
                    return invalid(format!("block {} ({}) can't carry a rotation", i + 1, block.kind));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> { Ok(toml::to_string_pretty(self)?) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_is_the_three_block_plan() {
        let config = TaskConfig::default();
        let plan: Vec<_> = config.blocks.iter().map(|b| (b.kind.tag(), b.trials)).collect();
        assert_eq!(plan, vec![(1, 20), (2, 60), (3, 20)]);
        assert_eq!(config.blocks[1].rotation_degrees, Some(-45.0));
        assert_eq!(config.total_trials(), 100);
        assert_eq!(config.timing.inter_trial_delay(), Duration::from_millis(1500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn single_block_preset() {
        let config = TaskConfig::single_block();
        assert_eq!(config.blocks, vec![Block::baseline(20)]);
        assert_eq!(config.timing.inter_trial_delay(), Duration::from_millis(1000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn center_is_half_the_display() {
        assert_eq!(DisplayConfig::default().center(), Point2::new(400.0, 400.0));
        let odd = DisplayConfig { width: 801.0, height: 599.0, ..Default::default() };
        assert_eq!(odd.center(), Point2::new(400.0, 299.0));
    }

    #[test]
    fn rotation_outside_rotated_blocks_is_rejected() {
        let mut config = TaskConfig::default();
        config.blocks[0].rotation_degrees = Some(30.0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = TaskConfig::default();
        config.blocks[1].rotation_degrees = None;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn empty_plans_are_rejected() {
        let config = TaskConfig { blocks: vec![], ..TaskConfig::default() };
        assert!(config.validate().is_err());
        let config = TaskConfig { blocks: vec![Block::baseline(0)], ..TaskConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn minimal_toml_fills_in_defaults() {
        let config: TaskConfig = toml::from_str(
            r#"
            [[blocks]]
            kind = "baseline"
            trials = 5

            [[blocks]]
            kind = "rotated"
            trials = 10
            rotation_degrees = 30.0
            "#,
        )
        .unwrap();
        assert_eq!(config.blocks, vec![Block::baseline(5), Block::rotated(10, 30.0)]);
        assert_eq!(config.display, DisplayConfig::default());
        assert_eq!(config.timing, TimingConfig::default());
        assert!(config.wrap_error);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("task.toml");

        let mut original = TaskConfig::single_block();
        original.timing.movement_timeout_ms = None;
        original.wrap_error = false;
        original.save(&path).unwrap();

        let loaded = TaskConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn load_reports_invalid_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "blocks = 3").unwrap();
        assert!(matches!(TaskConfig::load(&path), Err(ConfigError::Parse(_))));
        assert!(matches!(TaskConfig::load(&dir.path().join("missing.toml")), Err(ConfigError::Io(_))));
    }
}
