//! Daemon configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.healer/
//!   config.yaml   (optional, every field has a default)
//! ```
//!
//! As with the rest of the crate, path-taking functions come in two forms:
//! `fn_at(home: &Path, …)` for tests and `fn(…)` deriving home from
//! `dirs::home_dir()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BIND: &str = "0.0.0.0:9106";
pub const DEFAULT_HEAL_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_ADB_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SETTLE_DELAY_SECS: u64 = 3;
pub const DEFAULT_PACKAGE: &str = "com.spotify.music";
pub const DEFAULT_ACTIVITY: &str = "com.spotify.music/.MainActivity";

/// Effective configuration of the healer daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealerConfig {
    /// Socket address the HTTP API listens on.
    pub bind: String,
    pub heal_interval_secs: u64,
    /// Upper bound for every single device command.
    pub adb_timeout_secs: u64,
    /// Pause between launching the app and sending play.
    pub settle_delay_secs: u64,
    /// Randomise the first cycle of each watcher within one interval.
    pub stagger: bool,
    pub adb_path: PathBuf,
    /// Package name of the watched app; doubles as the media-session marker.
    pub package: String,
    /// Component started by the launch action (`am start -n`).
    pub activity: String,
    /// Optional JSON device inventory used for fleet presence metrics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<PathBuf>,
}

impl Default for HealerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            heal_interval_secs: DEFAULT_HEAL_INTERVAL_SECS,
            adb_timeout_secs: DEFAULT_ADB_TIMEOUT_SECS,
            settle_delay_secs: DEFAULT_SETTLE_DELAY_SECS,
            stagger: true,
            adb_path: PathBuf::from("adb"),
            package: DEFAULT_PACKAGE.to_string(),
            activity: DEFAULT_ACTIVITY.to_string(),
            inventory: None,
        }
    }
}

impl HealerConfig {
    pub fn heal_interval(&self) -> Duration {
        Duration::from_secs(self.heal_interval_secs)
    }

    pub fn adb_timeout(&self) -> Duration {
        Duration::from_secs(self.adb_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    /// Reject values the scheduler or adapter cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heal_interval_secs == 0 {
            return Err(invalid("heal_interval_secs", "must be greater than zero"));
        }
        if self.adb_timeout_secs == 0 {
            return Err(invalid("adb_timeout_secs", "must be greater than zero"));
        }
        if self.package.trim().is_empty() {
            return Err(invalid("package", "must not be empty"));
        }
        if self.activity.trim().is_empty() {
            return Err(invalid("activity", "must not be empty"));
        }
        if self.bind.trim().is_empty() {
            return Err(invalid("bind", "must not be empty"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// `<home>/.healer/`
pub fn healer_root(home: &Path) -> PathBuf {
    home.join(".healer")
}

/// `<home>/.healer/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    healer_root(home).join("config.yaml")
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load and validate a config file that must exist.
pub fn load_from(path: &Path) -> Result<HealerConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: HealerConfig =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

/// Load `<home>/.healer/config.yaml`, falling back to defaults when absent.
pub fn load_at(home: &Path) -> Result<HealerConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(HealerConfig::default());
    }
    load_from(&path)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<HealerConfig, ConfigError> {
    load_at(&home()?)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}
