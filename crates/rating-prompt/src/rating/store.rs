use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::record::UsageRecord;

/// Persistence for the single usage record of an installation.
///
/// A store with nothing persisted yet behaves as if it held `UsageRecord::default()`.
pub trait RecordStore: Send + Sync {
    fn load(&self) -> Result<UsageRecord, StoreError>;

    /// Applies `mutate` as one atomic read-modify-write and returns the stored result.
    fn update(
        &self,
        mutate: &mut dyn FnMut(&mut UsageRecord),
    ) -> Result<UsageRecord, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("stored record at {} is malformed: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store, the default when a host does not supply one.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    record: Mutex<UsageRecord>,
}

impl InMemoryRecordStore {
    pub fn new(record: UsageRecord) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }

    pub fn snapshot(&self) -> UsageRecord {
        self.record.lock().expect("record mutex poisoned").clone()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn load(&self) -> Result<UsageRecord, StoreError> {
        let guard = self
            .record
            .lock()
            .map_err(|_| StoreError::Unavailable("record mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn update(
        &self,
        mutate: &mut dyn FnMut(&mut UsageRecord),
    ) -> Result<UsageRecord, StoreError> {
        let mut guard = self
            .record
            .lock()
            .map_err(|_| StoreError::Unavailable("record mutex poisoned".to_string()))?;
        mutate(&mut *guard);
        Ok(guard.clone())
    }
}

/// Keeps the record as a JSON object on disk, keyed by the persisted field names.
///
/// Writes go to a sibling temporary file which is then renamed over the original, so a
/// reader never observes a half-written record.
#[derive(Debug)]
pub struct JsonFileRecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<UsageRecord, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(UsageRecord::default())
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(UsageRecord::default());
        }

        serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, record: &UsageRecord) -> Result<(), StoreError> {
        let io_error = |source: io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }

        let payload = serde_json::to_vec_pretty(record).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })?;

        let staging = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&staging).map_err(io_error)?;
        file.write_all(&payload).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        fs::rename(&staging, &self.path).map_err(io_error)
    }
}

impl RecordStore for JsonFileRecordStore {
    fn load(&self) -> Result<UsageRecord, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Unavailable("file store mutex poisoned".to_string()))?;
        self.read()
    }

    fn update(
        &self,
        mutate: &mut dyn FnMut(&mut UsageRecord),
    ) -> Result<UsageRecord, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Unavailable("file store mutex poisoned".to_string()))?;
        let mut record = self.read()?;
        mutate(&mut record);
        self.write(&record)?;
        Ok(record)
    }
}
