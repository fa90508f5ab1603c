// ── Core error types ──
//
// Three families, matching where each error is allowed to surface:
// value access errors reach the reader, device errors never leave the
// polling loop, and monitor errors come only from `start()`.

use thiserror::Error;

use crate::value::ValueKind;

/// Reading a property out of a [`Status`](crate::Status) failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: ValueKind, found: ValueKind },

    #[error("missing property '{name}'")]
    MissingProperty { name: String },
}

/// A single device failed to produce its status for one cycle.
///
/// The monitor absorbs these: the device is simply absent from that
/// cycle's snapshot.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data: {detail}")]
    Parse { detail: String },

    #[error("missing property '{name}'")]
    MissingProperty { name: String },

    #[error("property '{name}' should be {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: ValueKind,
        found: String,
    },

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("device failed: {message}")]
    Failed { message: String },
}

impl DeviceError {
    /// Shorthand for an ad-hoc failure raised by a device implementation.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// The monitor could not be started.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("polling interval must be greater than zero")]
    InvalidInterval,

    #[error("failed to build the polling timer: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to spawn polling thread '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}
