//! `devmon check`: validate the config and list its devices.

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let (path, config) = super::load(global)?;
    tracing::info!(
        path = %path.display(),
        devices = config.devices.len(),
        "config is valid"
    );
    let rendered = output::render_config(global.output, &config)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
