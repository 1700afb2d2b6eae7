//! Simulation configuration file handling
//!
//! Loads and manages the ~/.config/gridswarm/config.yaml file.

use crate::swarm::Grid;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Simulation configuration
///
/// Everything the driver can tune at construction time. All other behavior
/// is fixed: movement rules, FIFO fairness, migration policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Number of robots to spawn
    #[serde(default = "default_robots")]
    pub robots: u32,

    /// Grid width in cells
    #[serde(default = "default_grid_width")]
    pub grid_width: i32,

    /// Grid height in cells
    #[serde(default = "default_grid_height")]
    pub grid_height: i32,

    /// Maximum buffered payloads per mailbox
    #[serde(default = "default_buffer_limit")]
    pub buffer_limit: usize,

    /// Per-step probability that a robot crashes
    #[serde(default = "default_failure_probability")]
    pub failure_probability: f64,

    /// Scheduler turns of simulated work inside the critical section
    #[serde(default = "default_hold_steps")]
    pub hold_steps: u32,

    /// Per-step probability that a robot sends a payload
    #[serde(default = "default_send_probability")]
    pub send_probability: f64,

    /// RNG seed for reproducible runs; omit for a fresh run each time
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Milliseconds between driver ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_robots() -> u32 {
    6
}

fn default_grid_width() -> i32 {
    10
}

fn default_grid_height() -> i32 {
    10
}

fn default_buffer_limit() -> usize {
    3
}

fn default_failure_probability() -> f64 {
    0.01
}

fn default_hold_steps() -> u32 {
    5
}

fn default_send_probability() -> f64 {
    0.2
}

fn default_tick_interval_ms() -> u64 {
    200
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            robots: default_robots(),
            grid_width: default_grid_width(),
            grid_height: default_grid_height(),
            buffer_limit: default_buffer_limit(),
            failure_probability: default_failure_probability(),
            hold_steps: default_hold_steps(),
            send_probability: default_send_probability(),
            seed: None,
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl SimConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Grid bounds as a value type
    pub fn grid(&self) -> Grid {
        Grid {
            width: self.grid_width,
            height: self.grid_height,
        }
    }

    /// The default config path (~/.config/gridswarm/config.yaml)
    pub fn default_path() -> PathBuf {
        // Always use ~/.config for consistency across platforms (macOS, Linux)
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("gridswarm");
        path.push("config.yaml");
        path
    }

    /// Load configuration from the default path
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::GridSwarmError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path)?;
        let config: SimConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a specific path, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_yaml::to_string(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SimConfig::default();

        assert_eq!(config.robots, 6);
        assert_eq!(config.grid_width, 10);
        assert_eq!(config.grid_height, 10);
        assert_eq!(config.buffer_limit, 3);
        assert_eq!(config.hold_steps, 5);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let config = SimConfig {
            robots: 12,
            seed: Some(7),
            ..SimConfig::default()
        };
        config.save(&config_path).unwrap();

        let loaded = SimConfig::load(&config_path).unwrap();
        assert_eq!(loaded.robots, 12);
        assert_eq!(loaded.seed, Some(7));
        assert_eq!(loaded.buffer_limit, 3);
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.yaml");

        let err = SimConfig::load(&missing).unwrap_err();
        assert!(matches!(err, crate::GridSwarmError::Config(_)));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: SimConfig = serde_yaml::from_str("robots: 3\n").unwrap();

        assert_eq!(config.robots, 3);
        assert_eq!(config.grid_width, 10);
        assert_eq!(config.failure_probability, 0.01);
    }
}
