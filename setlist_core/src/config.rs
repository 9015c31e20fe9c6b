//! Configuration file support for setlist.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/setlist/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub builder: BuilderConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Live session behaviour
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Pause between completing a set and moving on, in milliseconds
    #[serde(default = "default_advance_delay_ms")]
    pub advance_delay_ms: u64,

    /// Rest applied to newly added standalone exercises, in seconds
    #[serde(default = "default_rest_seconds")]
    pub default_rest_seconds: u32,

    /// Skip rest timers immediately when running unattended
    #[serde(default)]
    pub auto_cancel_rest: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            advance_delay_ms: default_advance_delay_ms(),
            default_rest_seconds: default_rest_seconds(),
            auto_cancel_rest: false,
        }
    }
}

impl SessionConfig {
    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }
}

/// Defaults and caps for the superset builder
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuilderConfig {
    #[serde(default = "default_reps")]
    pub default_reps: u32,

    #[serde(default = "default_time_seconds")]
    pub default_time_seconds: u32,

    #[serde(default = "default_rounds")]
    pub default_rounds: u32,

    #[serde(default = "default_round_rest_seconds")]
    pub default_round_rest_seconds: u32,

    #[serde(default = "default_exercise_rest_seconds")]
    pub default_exercise_rest_seconds: u32,

    /// Upper bound on rounds; 0 disables the cap
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            default_reps: default_reps(),
            default_time_seconds: default_time_seconds(),
            default_rounds: default_rounds(),
            default_round_rest_seconds: default_round_rest_seconds(),
            default_exercise_rest_seconds: default_exercise_rest_seconds(),
            max_rounds: default_max_rounds(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("setlist")
}

fn default_advance_delay_ms() -> u64 {
    600
}

fn default_rest_seconds() -> u32 {
    60
}

fn default_reps() -> u32 {
    10
}

fn default_time_seconds() -> u32 {
    30
}

fn default_rounds() -> u32 {
    3
}

fn default_round_rest_seconds() -> u32 {
    90
}

fn default_exercise_rest_seconds() -> u32 {
    15
}

fn default_max_rounds() -> u32 {
    5
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("setlist").join("config.toml")
    }

    /// Reject values the builder could never satisfy
    pub fn validate(&self) -> Result<()> {
        let b = &self.builder;
        if b.default_reps == 0 || b.default_time_seconds == 0 {
            return Err(Error::Config(
                "builder defaults for reps and time must be positive".into(),
            ));
        }
        if b.default_rounds == 0 {
            return Err(Error::Config("builder.default_rounds must be positive".into()));
        }
        if b.max_rounds > 0 && b.default_rounds > b.max_rounds {
            return Err(Error::Config(format!(
                "builder.default_rounds ({}) exceeds max_rounds ({})",
                b.default_rounds, b.max_rounds
            )));
        }
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
