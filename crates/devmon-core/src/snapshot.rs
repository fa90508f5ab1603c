// ── Published snapshots ──
//
// One immutable snapshot per polling cycle. The monitor hands readers an
// `Arc<Snapshot>`; a superseded snapshot stays valid for as long as any
// reader holds it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::device::DeviceId;
use crate::error::ValueError;
use crate::value::{FromValue, Status, get_property};

/// Device identity → that device's status for one cycle.
pub type StatusMap = BTreeMap<DeviceId, Status>;

/// The complete result of one polling cycle.
///
/// Only devices whose fetch succeeded in that cycle are present, and each
/// present device carries the full status it returned.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    cycle: u64,
    captured_at: DateTime<Utc>,
    statuses: StatusMap,
}

impl Snapshot {
    pub(crate) fn new(cycle: u64, captured_at: DateTime<Utc>, statuses: StatusMap) -> Self {
        Self {
            cycle,
            captured_at,
            statuses,
        }
    }

    /// 1-based cycle number within the current monitor run.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// When this cycle finished fetching.
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn statuses(&self) -> &StatusMap {
        &self.statuses
    }

    pub fn get(&self, id: DeviceId) -> Option<&Status> {
        self.statuses.get(&id)
    }

    pub fn contains(&self, id: DeviceId) -> bool {
        self.statuses.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeviceId, &Status)> {
        self.statuses.iter().map(|(id, status)| (*id, status))
    }

    /// Read one property of one device.
    ///
    /// Returns `None` if the device is absent from this snapshot.
    pub fn property<T: FromValue>(
        &self,
        id: DeviceId,
        name: &str,
    ) -> Option<Result<T, ValueError>> {
        self.get(id).map(|status| get_property(status, name))
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a DeviceId, &'a Status);
    type IntoIter = std::collections::btree_map::Iter<'a, DeviceId, Status>;

    fn into_iter(self) -> Self::IntoIter {
        self.statuses.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::value::status;

    fn sample() -> Snapshot {
        let mut statuses = StatusMap::new();
        statuses.insert(DeviceId::new(0), status([("value", 20)]));
        statuses.insert(DeviceId::new(2), status([("label", "lamp")]));
        Snapshot::new(3, DateTime::<Utc>::UNIX_EPOCH, statuses)
    }

    #[test]
    fn lookups_by_device() {
        let snap = sample();
        assert_eq!(snap.cycle(), 3);
        assert_eq!(snap.len(), 2);
        assert!(snap.contains(DeviceId::new(0)));
        assert!(!snap.contains(DeviceId::new(1)));
        assert_eq!(snap.get(DeviceId::new(2)).unwrap().len(), 1);
    }

    #[test]
    fn property_distinguishes_absent_device_from_bad_read() {
        let snap = sample();
        assert_eq!(snap.property::<i64>(DeviceId::new(0), "value"), Some(Ok(20)));
        assert!(snap.property::<i64>(DeviceId::new(1), "value").is_none());
        assert!(matches!(
            snap.property::<bool>(DeviceId::new(0), "value"),
            Some(Err(ValueError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn iterates_in_id_order() {
        let ids: Vec<u64> = sample().iter().map(|(id, _)| id.get()).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn serializes_with_numeric_device_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["cycle"], 3);
        assert_eq!(json["statuses"]["0"]["value"], 20);
        assert_eq!(json["statuses"]["2"]["label"], "lamp");
    }
}
