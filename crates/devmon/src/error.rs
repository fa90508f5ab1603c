//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use devmon_config::ConfigError;
use devmon_core::MonitorError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(devmon::validation))]
    Validation { field: String, reason: String },

    #[error("No devices configured in {path}")]
    #[diagnostic(
        code(devmon::no_devices),
        help(
            "Declare at least one device, e.g.\n\n\
             [devices.lamp]\n\
             path = \"lamp.json\"\n\
             properties = {{ voltage = \"float\" }}"
        )
    )]
    NoDevices { path: String },

    #[error("Could not load configuration")]
    #[diagnostic(
        code(devmon::config),
        help("Check the TOML syntax and the DEVMON_* environment overrides.")
    )]
    Config(#[source] ConfigError),

    // ── Monitor ──────────────────────────────────────────────────────

    #[error("Device monitor failed to start")]
    #[diagnostic(code(devmon::monitor))]
    Monitor(#[from] MonitorError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render JSON output: {0}")]
    #[diagnostic(code(devmon::json))]
    Json(#[from] serde_json::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::NoDevices { .. } => exit_code::USAGE,
            Self::Config(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}
