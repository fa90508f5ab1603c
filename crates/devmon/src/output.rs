//! Output formatting: table or JSON.
//!
//! Table uses `tabled`, structured formats serialize via serde.

use std::collections::BTreeMap;
use std::io::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use devmon_config::Config;
use devmon_core::{DeviceId, Snapshot, Status};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Display names for the devices a command registered.
pub type DeviceNames = BTreeMap<DeviceId, String>;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Property")]
    property: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Kind")]
    kind: String,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Device")]
    name: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Properties")]
    properties: String,
}

// ── Structured reports ──────────────────────────────────────────────

#[derive(Serialize)]
struct SnapshotReport<'a> {
    cycle: u64,
    captured_at: DateTime<Utc>,
    devices: BTreeMap<&'a str, &'a Status>,
    unavailable: Vec<&'a str>,
}

impl<'a> SnapshotReport<'a> {
    fn new(names: &'a DeviceNames, snapshot: &'a Snapshot) -> Self {
        let mut devices = BTreeMap::new();
        let mut unavailable = Vec::new();
        for (id, name) in names {
            match snapshot.get(*id) {
                Some(status) => {
                    devices.insert(name.as_str(), status);
                }
                None => unavailable.push(name.as_str()),
            }
        }
        Self {
            cycle: snapshot.cycle(),
            captured_at: snapshot.captured_at(),
            devices,
            unavailable,
        }
    }
}

// ── Render dispatchers ──────────────────────────────────────────────

/// Render one snapshot, labelling devices by their configured names.
pub fn render_snapshot(
    format: OutputFormat,
    names: &DeviceNames,
    snapshot: &Snapshot,
) -> Result<String, CliError> {
    let report = SnapshotReport::new(names, snapshot);
    match format {
        OutputFormat::Table => {
            let mut rows = Vec::new();
            for (name, status) in &report.devices {
                rows.extend(status.iter().map(|(property, value)| ReadingRow {
                    device: (*name).to_owned(),
                    property: property.clone(),
                    value: value.to_string(),
                    kind: value.kind().to_string(),
                }));
            }
            rows.extend(report.unavailable.iter().map(|name| ReadingRow {
                device: (*name).to_owned(),
                property: "-".into(),
                value: "unavailable".into(),
                kind: "-".into(),
            }));
            Ok(format!(
                "Cycle {} at {}\n{}",
                report.cycle,
                report.captured_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                render_table(&rows)
            ))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&report)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(&report)?),
    }
}

/// Render the resolved configuration.
pub fn render_config(format: OutputFormat, config: &Config) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let rows: Vec<DeviceRow> = config
                .devices
                .iter()
                .map(|(name, device)| DeviceRow {
                    name: name.clone(),
                    path: device.path.display().to_string(),
                    properties: device
                        .properties
                        .iter()
                        .map(|(property, kind)| format!("{property}: {kind}"))
                        .collect::<Vec<_>>()
                        .join(", "),
                })
                .collect();
            Ok(format!(
                "Interval: {} ms, thread: {}\n{}",
                config.interval_ms,
                config.thread_name,
                render_table(&rows)
            ))
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(config)?),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
    let _ = stdout.flush();
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use devmon_config::DeviceSpec;
    use devmon_core::{Device, DeviceError, GeneratorDevice, Monitor, ValueKind, status};
    use pretty_assertions::assert_eq;

    use super::*;

    /// Poll a two-device monitor until it publishes; `door` always fails.
    fn sample_snapshot() -> (DeviceNames, Arc<Snapshot>) {
        let monitor = Monitor::new(Duration::from_millis(10));
        let lamp = monitor.register_device(|id| {
            GeneratorDevice::constant(id, status([("voltage", 3.5)]))
        });
        let door = monitor.register_device(|id| {
            GeneratorDevice::new(id, || Err(DeviceError::failed("jammed")))
        });
        monitor.start().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        let snapshot = loop {
            if let Some(snapshot) = monitor.get_statuses() {
                break snapshot;
            }
            assert!(Instant::now() < deadline, "no snapshot published");
            std::thread::sleep(Duration::from_millis(5));
        };
        monitor.stop();

        let names = DeviceNames::from([
            (lamp.id(), "lamp".to_owned()),
            (door.id(), "door".to_owned()),
        ]);
        (names, snapshot)
    }

    #[test]
    fn table_lists_readings_and_unavailable_devices() {
        let (names, snapshot) = sample_snapshot();
        let text = render_snapshot(OutputFormat::Table, &names, &snapshot).unwrap();
        assert!(text.starts_with(&format!("Cycle {} at ", snapshot.cycle())));
        assert!(text.contains("voltage"));
        assert!(text.contains("3.5"));
        assert!(text.contains("float"));
        assert!(text.contains("unavailable"));
    }

    #[test]
    fn json_groups_readings_by_device_name() {
        let (names, snapshot) = sample_snapshot();
        let text = render_snapshot(OutputFormat::JsonCompact, &names, &snapshot).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(doc["devices"]["lamp"]["voltage"], 3.5);
        assert_eq!(doc["unavailable"], serde_json::json!(["door"]));
        assert_eq!(doc["cycle"], snapshot.cycle());
        assert!(!text.contains('\n'));
    }

    #[test]
    fn config_table_shows_paths_and_property_kinds() {
        let mut config = Config::default();
        config.devices.insert(
            "lamp".into(),
            DeviceSpec {
                path: "/tmp/lamp.json".into(),
                properties: BTreeMap::from([
                    ("current".to_owned(), ValueKind::Float),
                    ("on".to_owned(), ValueKind::Bool),
                ]),
            },
        );
        let text = render_config(OutputFormat::Table, &config).unwrap();
        assert!(text.starts_with("Interval: 500 ms"));
        assert!(text.contains("/tmp/lamp.json"));
        assert!(text.contains("current: float, on: bool"));
    }
}
