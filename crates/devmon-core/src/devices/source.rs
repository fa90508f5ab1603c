// ── Source-backed device ──
//
// Opens its file fresh on every fetch. The handle lives only inside
// `fetch_current_state`, so it is closed on every exit path.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::device::{Device, DeviceId};
use crate::error::DeviceError;
use crate::value::Status;

/// Turns an open source into a [`Status`].
///
/// The reader is owned by the caller; an extractor never closes or keeps it.
pub trait Extract: Send + Sync {
    fn extract(&self, reader: &mut dyn BufRead) -> Result<Status, DeviceError>;
}

/// Adapter that lets a closure act as an [`Extract`] step.
pub struct FnExtract<F>(F);

/// Wrap a closure as an [`Extract`] step.
pub fn extract_with<F>(f: F) -> FnExtract<F>
where
    F: Fn(&mut dyn BufRead) -> Result<Status, DeviceError> + Send + Sync,
{
    FnExtract(f)
}

impl<F> Extract for FnExtract<F>
where
    F: Fn(&mut dyn BufRead) -> Result<Status, DeviceError> + Send + Sync,
{
    fn extract(&self, reader: &mut dyn BufRead) -> Result<Status, DeviceError> {
        (self.0)(reader)
    }
}

/// A device backed by a named file.
pub struct SourceDevice<E> {
    id: DeviceId,
    path: PathBuf,
    extractor: E,
}

impl<E: Extract> SourceDevice<E> {
    pub fn new(id: DeviceId, path: impl Into<PathBuf>, extractor: E) -> Self {
        Self {
            id,
            path: path.into(),
            extractor,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }
}

impl<E: Extract> Device for SourceDevice<E> {
    fn id(&self) -> DeviceId {
        self.id
    }

    fn fetch_current_state(&self) -> Result<Status, DeviceError> {
        let file = File::open(&self.path).map_err(|source| DeviceError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let result = self.extractor.extract(&mut reader);
        drop(reader);
        trace!(device = %self.id, path = %self.path.display(), ok = result.is_ok(), "source read");
        result
    }
}

impl<E> fmt::Debug for SourceDevice<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceDevice")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::value::{get_property, status};

    fn whole_file() -> FnExtract<impl Fn(&mut dyn BufRead) -> Result<Status, DeviceError>> {
        extract_with(|reader: &mut dyn BufRead| {
            let mut content = String::new();
            reader
                .read_to_string(&mut content)
                .map_err(|e| DeviceError::Parse {
                    detail: e.to_string(),
                })?;
            Ok(status([("some_key", content)]))
        })
    }

    #[test]
    fn passes_file_contents_to_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, "lorem ipsum dolores sit amet").unwrap();

        let device = SourceDevice::new(DeviceId::new(0), &path, whole_file());
        let st = device.fetch_current_state().unwrap();

        assert_eq!(st.len(), 1);
        assert_eq!(
            get_property::<String>(&st, "some_key").unwrap(),
            "lorem ipsum dolores sit amet"
        );
    }

    #[test]
    fn rereads_file_on_every_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        std::fs::write(&path, "first").unwrap();

        let device = SourceDevice::new(DeviceId::new(0), &path, whole_file());
        assert_eq!(
            get_property::<String>(&device.fetch_current_state().unwrap(), "some_key").unwrap(),
            "first"
        );

        std::fs::write(&path, "second").unwrap();
        assert_eq!(
            get_property::<String>(&device.fetch_current_state().unwrap(), "some_key").unwrap(),
            "second"
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let device = SourceDevice::new(DeviceId::new(3), dir.path().join("absent"), whole_file());
        assert!(matches!(
            device.fetch_current_state(),
            Err(DeviceError::Io { .. })
        ));
    }

    #[test]
    fn extractor_failure_propagates_and_file_stays_removable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "garbage").unwrap();

        let failing = extract_with(|_: &mut dyn BufRead| Err(DeviceError::failed("unparseable")));
        let device = SourceDevice::new(DeviceId::new(4), &path, failing);

        assert!(matches!(
            device.fetch_current_state(),
            Err(DeviceError::Failed { .. })
        ));
        // The handle was dropped before returning, so the file can go away.
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            device.fetch_current_state(),
            Err(DeviceError::Io { .. })
        ));
    }
}
