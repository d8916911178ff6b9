//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is a small TOML file:
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [playback]
//! time_update_interval_ms = 500
//! volume = 0.8
//! rate = 1.25
//! speedup = 1.0
//! ```
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `ABNAV_CONFIG` environment variable
//! 3. `<config dir>/abnav/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing file is not fatal: a warning is logged and defaults are used.
//! A file that exists but fails to parse or validate is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "ABNAV_CONFIG";

/// Largest accepted simulation clock multiplier
pub const MAX_SPEEDUP: f64 = 10_000.0;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Playback defaults applied to new sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Cadence of periodic time notifications
    #[serde(default = "default_time_update_interval_ms")]
    pub time_update_interval_ms: u64,

    /// Initial volume, 0.0 to 1.0
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Initial playback rate
    #[serde(default = "default_rate")]
    pub rate: f64,

    /// Simulation clock multiplier for the CLI player
    #[serde(default = "default_speedup")]
    pub speedup: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            time_update_interval_ms: default_time_update_interval_ms(),
            volume: default_volume(),
            rate: default_rate(),
            speedup: default_speedup(),
        }
    }
}

impl PlaybackConfig {
    pub fn time_update_interval(&self) -> Duration {
        Duration::from_millis(self.time_update_interval_ms)
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_time_update_interval_ms() -> u64 {
    500
}

fn default_volume() -> f64 {
    1.0
}

fn default_rate() -> f64 {
    1.0
}

fn default_speedup() -> f64 {
    1.0
}

impl TomlConfig {
    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Check value ranges
    ///
    /// Navigator setters reject out-of-range values by panicking, so bad
    /// values are caught here as recoverable errors first.
    pub fn validate(&self) -> Result<()> {
        let playback = &self.playback;

        if playback.time_update_interval_ms == 0 {
            return Err(Error::Config(
                "playback.time_update_interval_ms must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&playback.volume) {
            return Err(Error::Config(format!(
                "playback.volume must be between 0.0 and 1.0, got {}",
                playback.volume
            )));
        }
        if !(playback.rate >= 0.0 && playback.rate.is_finite()) {
            return Err(Error::Config(format!(
                "playback.rate must be a finite value >= 0.0, got {}",
                playback.rate
            )));
        }
        if !(playback.speedup > 0.0 && playback.speedup <= MAX_SPEEDUP) {
            return Err(Error::Config(format!(
                "playback.speedup must be > 0.0 and <= {}, got {}",
                MAX_SPEEDUP, playback.speedup
            )));
        }
        Ok(())
    }
}

/// Where a config file path came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    UserConfigDir,
}

/// Find the config file to load, following the priority order
///
/// Command-line and environment paths are returned whether or not they
/// exist; the per-user default is only returned when present.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<(PathBuf, ConfigSource)> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some((path.to_path_buf(), ConfigSource::CommandLine));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some((PathBuf::from(path), ConfigSource::Environment));
        }
    }

    // Priority 3: Per-user config directory
    default_config_path()
        .filter(|path| path.exists())
        .map(|path| (path, ConfigSource::UserConfigDir))
}

/// `<config dir>/abnav/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("abnav").join("config.toml"))
}

/// Resolve and load configuration, falling back to compiled defaults
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    // Priority 4: Compiled defaults
    let Some((path, source)) = resolve_config_path(cli_arg) else {
        info!("No config file found, using built-in defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!(
            "Config file {} ({:?}) does not exist, using built-in defaults",
            path.display(),
            source
        );
        return Ok(TomlConfig::default());
    }

    info!("Loading config from {} ({:?})", path.display(), source);
    TomlConfig::load(&path)
}
