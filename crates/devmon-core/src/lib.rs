//! Interval-driven device polling with lock-free snapshot publication.
//!
//! - **[`Monitor`]**: Owns the device registry and one dedicated polling
//!   thread. Every interval it fetches each registered device in turn,
//!   assembles the successes into a new [`Snapshot`], and publishes it with
//!   a single atomic pointer swap. [`start()`](Monitor::start) and
//!   [`stop()`](Monitor::stop) are idempotent; readers call
//!   [`get_statuses()`](Monitor::get_statuses) from any thread without
//!   taking a lock.
//!
//! - **[`Device`]**: The capability the monitor polls: a stable
//!   [`DeviceId`] plus a synchronous `fetch_current_state`. A device that
//!   fails in a cycle is simply absent from that cycle's snapshot.
//!
//! - **Reference devices** ([`devices`]): [`GeneratorDevice`] wraps a
//!   producer closure, [`SourceDevice`] opens a file per fetch and hands it
//!   to an [`Extract`] step, and [`JsonFileDevice`] reads typed properties
//!   from a JSON object.
//!
//! - **[`Value`] / [`Status`]**: Typed attribute values with kind-checked
//!   access through [`get_property`].
//!
//! ```no_run
//! use std::time::Duration;
//! use devmon_core::{Device, GeneratorDevice, Monitor, get_property, status};
//!
//! let monitor = Monitor::new(Duration::from_millis(100));
//! let sensor = monitor.register_device(|id| {
//!     GeneratorDevice::new(id, || Ok(status([("value", 20)])))
//! });
//! monitor.start().expect("polling thread");
//! std::thread::sleep(Duration::from_millis(200));
//!
//! if let Some(snapshot) = monitor.get_statuses() {
//!     if let Some(reading) = snapshot.get(sensor.id()) {
//!         let value: i64 = get_property(reading, "value").expect("int value");
//!         println!("sensor {} = {value}", sensor.id());
//!     }
//! }
//! monitor.stop();
//! ```

pub mod config;
pub mod device;
pub mod devices;
pub mod error;
pub mod monitor;
pub mod snapshot;
pub mod value;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::MonitorConfig;
pub use device::{Device, DeviceId};
pub use devices::{
    Extract, FnExtract, GeneratorDevice, JsonExtractor, JsonFileDevice, SourceDevice,
    extract_with,
};
pub use error::{DeviceError, MonitorError, ValueError};
pub use monitor::Monitor;
pub use snapshot::{Snapshot, StatusMap};
pub use value::{FromValue, Status, Value, ValueKind, get_property, status};
