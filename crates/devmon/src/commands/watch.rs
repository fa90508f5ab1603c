//! `devmon watch`: poll the configured devices and print each snapshot.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use devmon_core::{Device, JsonFileDevice, Monitor};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output::{self, DeviceNames};

/// Lower bound on how often the published snapshot is sampled.
const MIN_SAMPLE_PERIOD: Duration = Duration::from_millis(10);

pub async fn handle(args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (path, mut config) = super::load(global)?;

    if let Some(ms) = args.interval_ms {
        if ms == 0 {
            return Err(CliError::Validation {
                field: "--interval-ms".into(),
                reason: "must be greater than zero".into(),
            });
        }
        config.interval_ms = ms;
    }
    if config.devices.is_empty() {
        return Err(CliError::NoDevices {
            path: path.display().to_string(),
        });
    }

    let monitor = Monitor::with_config(config.monitor_config());
    let mut names = DeviceNames::new();
    for (name, spec) in &config.devices {
        let device = monitor.register_device(|id| {
            JsonFileDevice::json(id, spec.path.clone(), spec.properties.clone())
        });
        debug!(device = %name, id = %device.id(), path = %spec.path.display(), "registered device");
        names.insert(device.id(), name.clone());
    }

    monitor.start()?;
    let result = print_snapshots(&monitor, &names, config.interval(), args.count, global).await;
    // Joins the polling thread.
    tokio::task::block_in_place(|| monitor.stop());
    result
}

/// Print every newly published snapshot until `count` have been shown or
/// the process is interrupted.
async fn print_snapshots(
    monitor: &Monitor,
    names: &DeviceNames,
    interval: Duration,
    count: Option<u64>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if count == Some(0) {
        return Ok(());
    }

    // Sample twice per cycle so no published snapshot is skipped.
    let mut ticker = tokio::time::interval((interval / 2).max(MIN_SAMPLE_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last_cycle = None;
    let mut printed = 0_u64;
    loop {
        tokio::select! {
            biased;
            result = &mut shutdown => {
                result?;
                info!(printed, "interrupted, stopping");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let Some(snapshot) = monitor.get_statuses() else {
            continue;
        };
        if last_cycle == Some(snapshot.cycle()) {
            continue;
        }
        last_cycle = Some(snapshot.cycle());

        let rendered = output::render_snapshot(global.output, names, &snapshot)?;
        output::print_output(&rendered, global.quiet);

        printed += 1;
        if count.is_some_and(|limit| printed >= limit) {
            return Ok(());
        }
    }
}
