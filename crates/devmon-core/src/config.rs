// ── Runtime monitor configuration ──
//
// Built by the caller and handed to `Monitor`. Core never reads files;
// `devmon-config` translates the on-disk config into this type.

use std::time::Duration;

/// Default polling interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Default name of the polling thread.
pub const DEFAULT_THREAD_NAME: &str = "devmon-poller";

/// Tuning for a single [`Monitor`](crate::Monitor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Time between the starts of consecutive polling cycles.
    pub interval: Duration,
    /// Name given to the polling thread (visible in debuggers and `top -H`).
    pub thread_name: String,
}

impl MonitorConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            thread_name: DEFAULT_THREAD_NAME.into(),
        }
    }
}
