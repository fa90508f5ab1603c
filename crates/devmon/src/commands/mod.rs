//! Command handlers.

pub mod check;
pub mod watch;

use std::path::PathBuf;

use devmon_config::{Config, config_path, load_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the config named by `--config`, falling back to the platform path.
pub fn load(global: &GlobalOpts) -> Result<(PathBuf, Config), CliError> {
    let path = global.config.clone().unwrap_or_else(config_path);
    tracing::debug!(path = %path.display(), "loading config");
    let config = load_config(&path)?;
    Ok((path, config))
}
