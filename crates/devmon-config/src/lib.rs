//! Configuration for the devmon binary.
//!
//! A TOML file (defaulting to the platform config dir) layered with
//! `DEVMON_`-prefixed environment variables, validated and translated to
//! `devmon_core::MonitorConfig`. Core never reads config files.
//!
//! ```toml
//! interval_ms = 500
//!
//! [devices.lamp]
//! path = "lamp.json"
//! properties = { voltage = "float", current = "float" }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use devmon_core::{MonitorConfig, ValueKind};
use devmon_core::config::{DEFAULT_INTERVAL, DEFAULT_THREAD_NAME};

/// Prefix for environment overrides. Nested keys use `__`, e.g.
/// `DEVMON_INTERVAL_MS=250`.
pub const ENV_PREFIX: &str = "DEVMON_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Polling interval in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Name of the polling thread.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,

    /// JSON file devices, keyed by a display name.
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            thread_name: default_thread_name(),
            devices: BTreeMap::new(),
        }
    }
}

fn default_interval_ms() -> u64 {
    u64::try_from(DEFAULT_INTERVAL.as_millis()).unwrap_or(500)
}
fn default_thread_name() -> String {
    DEFAULT_THREAD_NAME.into()
}

/// One JSON file device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceSpec {
    /// JSON file to read on every cycle. Relative paths resolve against the
    /// directory holding the config file.
    pub path: PathBuf,

    /// Properties to read and the kind each must have.
    #[serde(default)]
    pub properties: BTreeMap<String, ValueKind>,
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig::new(self.interval()).with_thread_name(self.thread_name.clone())
    }

    /// Reject configurations the monitor cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::Validation {
                field: "interval_ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.thread_name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "thread_name".into(),
                reason: "must not be empty".into(),
            });
        }
        for (name, device) in &self.devices {
            if device.path.as_os_str().is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("devices.{name}.path"),
                    reason: "must not be empty".into(),
                });
            }
            if device.properties.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("devices.{name}.properties"),
                    reason: "declare at least one property".into(),
                });
            }
        }
        Ok(())
    }

    /// Make every relative device path absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for device in self.devices.values_mut() {
            if device.path.is_relative() {
                device.path = base.join(&device.path);
            }
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the default config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "devmon", "devmon").map_or_else(
        || PathBuf::from("devmon.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load, validate, and resolve the config at `path`.
///
/// A missing file is not an error: defaults plus environment overrides are
/// used instead.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let mut config: Config = figment.extract()?;
    config.validate()?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    Ok(config)
}
