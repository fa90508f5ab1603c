// ── Generator-backed device ──

use std::fmt;

use crate::device::{Device, DeviceId};
use crate::error::DeviceError;
use crate::value::Status;

type Producer = Box<dyn Fn() -> Result<Status, DeviceError> + Send + Sync>;

/// A device whose state is whatever its producer returns on each fetch.
///
/// The producer runs on every call, so it may return different data each
/// time or fail on some calls and not others.
pub struct GeneratorDevice {
    id: DeviceId,
    producer: Producer,
}

impl GeneratorDevice {
    pub fn new<F>(id: DeviceId, producer: F) -> Self
    where
        F: Fn() -> Result<Status, DeviceError> + Send + Sync + 'static,
    {
        Self {
            id,
            producer: Box::new(producer),
        }
    }

    /// A device that reports the same status on every fetch.
    pub fn constant(id: DeviceId, status: Status) -> Self {
        Self::new(id, move || Ok(status.clone()))
    }
}

impl Device for GeneratorDevice {
    fn id(&self) -> DeviceId {
        self.id
    }

    fn fetch_current_state(&self) -> Result<Status, DeviceError> {
        (self.producer)()
    }
}

impl fmt::Debug for GeneratorDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorDevice")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;
    use crate::value::{Value, get_property, status};

    #[test]
    fn returns_producer_values_with_their_kinds() {
        let device = GeneratorDevice::new(DeviceId::new(7), || {
            Ok(status([
                ("a", Value::from(15)),
                ("c", Value::from(5.6)),
                ("e", Value::from(true)),
                ("f", Value::from(false)),
                ("g", Value::from("test")),
                ("h", Value::from("")),
            ]))
        });

        assert_eq!(device.id(), DeviceId::new(7));

        let st = device.fetch_current_state().unwrap();
        assert_eq!(st.len(), 6);
        assert_eq!(get_property::<i64>(&st, "a").unwrap(), 15);
        assert!((get_property::<f64>(&st, "c").unwrap() - 5.6).abs() < f64::EPSILON);
        assert!(get_property::<bool>(&st, "e").unwrap());
        assert!(!get_property::<bool>(&st, "f").unwrap());
        assert_eq!(get_property::<String>(&st, "g").unwrap(), "test");
        assert!(get_property::<String>(&st, "h").unwrap().is_empty());
    }

    #[test]
    fn runs_producer_on_every_fetch() {
        let value = Arc::new(AtomicI64::new(5));
        let source = Arc::clone(&value);
        let device = GeneratorDevice::new(DeviceId::new(9), move || {
            Ok(status([("value", source.load(Ordering::SeqCst))]))
        });

        let st = device.fetch_current_state().unwrap();
        assert_eq!(get_property::<i64>(&st, "value").unwrap(), 5);

        value.store(19, Ordering::SeqCst);
        let st = device.fetch_current_state().unwrap();
        assert_eq!(get_property::<i64>(&st, "value").unwrap(), 19);
    }

    #[test]
    fn propagates_producer_failure() {
        let device = GeneratorDevice::new(DeviceId::new(0), || Err(DeviceError::failed("boom")));
        let err = device.fetch_current_state().unwrap_err();
        assert!(matches!(err, DeviceError::Failed { ref message } if message == "boom"));
    }

    #[test]
    fn constant_repeats_status() {
        let device = GeneratorDevice::constant(DeviceId::new(1), status([("v", 1)]));
        assert_eq!(
            device.fetch_current_state().unwrap(),
            device.fetch_current_state().unwrap()
        );
    }
}
