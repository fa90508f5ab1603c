// ── Device capability ──
//
// Anything the monitor can poll. Identity is handed out by the monitor at
// registration; a device only stores and reports it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DeviceError;
use crate::value::Status;

/// Stable identity of a registered device.
///
/// Assigned by [`Monitor::register_device`](crate::Monitor::register_device),
/// strictly increasing from 0 and never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DeviceId(u64);

impl DeviceId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DeviceId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// A pollable data source.
///
/// `fetch_current_state` is called once per cycle from the monitor's polling
/// thread. It must not block indefinitely, must release anything it acquires
/// on every return path, and must not make one call's outcome depend on an
/// earlier call's success or failure.
pub trait Device: Send + Sync {
    fn id(&self) -> DeviceId;

    fn fetch_current_state(&self) -> Result<Status, DeviceError>;
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn id(&self) -> DeviceId {
        (**self).id()
    }

    fn fetch_current_state(&self) -> Result<Status, DeviceError> {
        (**self).fetch_current_state()
    }
}
