//! # Conversion Configuration
//!
//! Kinematic limits, sampling and output options for a conversion run.
//! Every field has a default, so an empty file (or no file) is valid.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [motion]
//! timestep_ms = 1.0
//! acceleration = 40000.0
//! max_velocity = 2000.0
//! corner_velocity = 300.0
//!
//! [smoothing]
//! cutoff_hz = 20.0
//! ```
//!
//! ## Example: Rust Usage
//!
//! ```rust
//! use gcode_trajectory::config::Config;
//! let config: Config = toml::from_str("[motion]\ncorner_velocity = 250.0").unwrap();
//! assert_eq!(config.motion.corner_velocity, 250.0);
//! assert!(config.validate().is_ok());
//! ```

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Kinematic limits shared by the interpreter and the profile solver.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct MotionConfig {
    /// Time between trajectory samples (ms).
    #[serde(default = "default_timestep_ms")]
    pub timestep_ms: f64,
    /// Acceleration magnitude (mm/s²).
    #[serde(default = "default_acceleration")]
    pub acceleration: f64,
    /// Velocity ceiling (mm/s).
    #[serde(default = "default_max_velocity")]
    pub max_velocity: f64,
    /// Velocity at the start and end of every move (mm/s).
    #[serde(default = "default_corner_velocity")]
    pub corner_velocity: f64,
    /// Feedrate assumed before the first F word (mm/min).
    #[serde(default = "default_feedrate")]
    pub default_feedrate: f64,
}

impl MotionConfig {
    /// Sample rate implied by the timestep (Hz).
    pub fn sample_hz(&self) -> f64 {
        1000.0 / self.timestep_ms
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            timestep_ms: default_timestep_ms(),
            acceleration: default_acceleration(),
            max_velocity: default_max_velocity(),
            corner_velocity: default_corner_velocity(),
            default_feedrate: default_feedrate(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BufferConfig {
    /// Rows added to the trajectory buffer per growth step.
    #[serde(default = "default_allocation_block_size")]
    pub allocation_block_size: usize,
    /// Upper bound on the rows a single move or dwell may append.
    #[serde(default = "default_max_samples_per_line")]
    pub max_samples_per_line: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            allocation_block_size: default_allocation_block_size(),
            max_samples_per_line: default_max_samples_per_line(),
        }
    }
}

/// Zero-phase smoothing used for the LRA/SRA diagnostic columns.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SmoothingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cutoff_hz")]
    pub cutoff_hz: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self { enabled: true, cutoff_hz: default_cutoff_hz() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { directory: default_output_directory() }
    }
}

impl Config {
    /// Reject settings the solver and buffer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.motion;
        if !(m.timestep_ms > 0.0) {
            return Err(ConfigError::Invalid("motion.timestep_ms must be > 0".to_string()));
        }
        if !(m.acceleration > 0.0) {
            return Err(ConfigError::Invalid("motion.acceleration must be > 0".to_string()));
        }
        if !(m.max_velocity > 0.0) {
            return Err(ConfigError::Invalid("motion.max_velocity must be > 0".to_string()));
        }
        if !(m.corner_velocity >= 0.0 && m.corner_velocity <= m.max_velocity) {
            return Err(ConfigError::Invalid(format!(
                "motion.corner_velocity ({}) must be between 0 and max_velocity ({})",
                m.corner_velocity, m.max_velocity
            )));
        }
        if !(m.default_feedrate >= 0.0) {
            return Err(ConfigError::Invalid("motion.default_feedrate must be >= 0".to_string()));
        }
        if self.buffer.allocation_block_size == 0 {
            return Err(ConfigError::Invalid("buffer.allocation_block_size must be > 0".to_string()));
        }
        if self.buffer.max_samples_per_line == 0 {
            return Err(ConfigError::Invalid("buffer.max_samples_per_line must be > 0".to_string()));
        }
        let nyquist = m.sample_hz() / 2.0;
        let cutoff = self.smoothing.cutoff_hz;
        if !(cutoff > 0.0 && cutoff < nyquist) {
            return Err(ConfigError::Invalid(format!(
                "smoothing.cutoff_hz ({}) must be between 0 and {} Hz",
                cutoff, nyquist
            )));
        }
        Ok(())
    }
}

// Default value functions
fn default_timestep_ms() -> f64 { 1.0 }
fn default_acceleration() -> f64 { 40000.0 }
fn default_max_velocity() -> f64 { 2000.0 }
fn default_corner_velocity() -> f64 { 300.0 }
fn default_feedrate() -> f64 { 2000.0 }
fn default_allocation_block_size() -> usize { 5000 }
fn default_max_samples_per_line() -> usize { 10_000_000 }
fn default_cutoff_hz() -> f64 { 20.0 }
fn default_true() -> bool { true }
fn default_output_directory() -> String { "pathCSVs".to_string() }

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read config file '{}': {}", path.display(), e);
        ConfigError::Io(e)
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.motion.timestep_ms, 1.0);
        assert_eq!(config.motion.acceleration, 40000.0);
        assert_eq!(config.motion.max_velocity, 2000.0);
        assert_eq!(config.motion.corner_velocity, 300.0);
        assert_eq!(config.buffer.allocation_block_size, 5000);
        assert_eq!(config.buffer.max_samples_per_line, 10_000_000);
        assert_eq!(config.smoothing.cutoff_hz, 20.0);
        assert!(config.smoothing.enabled);
        assert_eq!(config.motion.sample_hz(), 1000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[motion]\nmax_velocity = 500.0\ntimestep_ms = 0.5").unwrap();
        file.flush().unwrap();
        let config = load_config(&file_path).unwrap();
        assert_eq!(config.motion.max_velocity, 500.0);
        assert_eq!(config.motion.sample_hz(), 2000.0);
        // Defaults for missing fields
        assert_eq!(config.motion.acceleration, 40000.0);
        assert_eq!(config.output.directory, "pathCSVs");
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(&file_path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_load_config_rejects_corner_above_max() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("fast_corners.toml");
        std::fs::write(&file_path, "[motion]\nmax_velocity = 100.0\ncorner_velocity = 300.0\n").unwrap();
        let result = load_config(&file_path);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_degenerate_values() {
        let mut config = Config::default();
        config.motion.acceleration = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.motion.timestep_ms = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.buffer.allocation_block_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.buffer.max_samples_per_line = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.smoothing.cutoff_hz = 600.0;
        assert!(config.validate().is_err());
    }
}
