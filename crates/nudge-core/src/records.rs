use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{debug, warn};
use nudge_platform::AppPaths;
use serde::{Deserialize, Serialize};

use crate::error::RecordStoreError;

/// Marks a message as already shown. Records are written once and never
/// updated; recording an identifier twice keeps the first timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub identifier: String,
    pub shown_at: DateTime<Utc>,
}

impl DisplayRecord {
    pub fn new(identifier: impl Into<String>, shown_at: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.into(),
            shown_at,
        }
    }
}

pub trait RecordStore: Send + Sync {
    /// # Errors
    /// Returns an error when the backing storage cannot be read.
    fn contains(&self, identifier: &str) -> Result<bool, RecordStoreError>;

    /// # Errors
    /// Returns an error when the backing storage cannot be written.
    fn record(&self, record: DisplayRecord) -> Result<(), RecordStoreError>;

    /// # Errors
    /// Returns an error when the backing storage cannot be read.
    fn records(&self) -> Result<Vec<DisplayRecord>, RecordStoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<DisplayRecord>>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DisplayRecord>> {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl RecordStore for MemoryRecordStore {
    fn contains(&self, identifier: &str) -> Result<bool, RecordStoreError> {
        Ok(self.lock().iter().any(|r| r.identifier == identifier))
    }

    fn record(&self, record: DisplayRecord) -> Result<(), RecordStoreError> {
        let mut records = self.lock();
        if !records.iter().any(|r| r.identifier == record.identifier) {
            records.push(record);
        }
        Ok(())
    }

    fn records(&self) -> Result<Vec<DisplayRecord>, RecordStoreError> {
        Ok(self.lock().clone())
    }
}

/// Records persisted as a JSON array. Writes go through a temp file and a
/// rename under an exclusive lock on a sibling `.lock` file, so concurrent
/// processes never lose each other's records.
#[derive(Debug, Clone)]
pub struct JsonFileRecordStore {
    path: PathBuf,
}

impl JsonFileRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the data directory of `app_name`.
    ///
    /// # Errors
    /// Returns an error when the application directories cannot be resolved.
    pub fn for_app(app_name: &str) -> Result<Self, RecordStoreError> {
        let paths = AppPaths::new(app_name)?;
        Ok(Self::new(paths.display_records_file()))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn load(&self) -> Result<Vec<DisplayRecord>, RecordStoreError> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(RecordStoreError::io("read failed", &error)),
        };

        match serde_json::from_str(&data) {
            Ok(records) => Ok(records),
            Err(error) => {
                warn!(
                    "Ignoring unreadable display records at {}: {error}",
                    self.path.display()
                );
                Ok(Vec::new())
            }
        }
    }
}

impl RecordStore for JsonFileRecordStore {
    fn contains(&self, identifier: &str) -> Result<bool, RecordStoreError> {
        Ok(self.load()?.iter().any(|r| r.identifier == identifier))
    }

    fn record(&self, record: DisplayRecord) -> Result<(), RecordStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|error| RecordStoreError::io("directory creation failed", &error))?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|error| RecordStoreError::io("lock file open failed", &error))?;
        lock_file
            .lock_exclusive()
            .map_err(|error| RecordStoreError::io("lock failed", &error))?;

        let mut records = self.load()?;
        if records.iter().any(|r| r.identifier == record.identifier) {
            return Ok(());
        }
        debug!("Recording display of {}", record.identifier);
        records.push(record);

        let data = serde_json::to_vec_pretty(&records)
            .map_err(|error| RecordStoreError::Encode(error.to_string()))?;
        write_atomic(&self.path, &data).map_err(|error| RecordStoreError::io("write failed", &error))
    }

    fn records(&self) -> Result<Vec<DisplayRecord>, RecordStoreError> {
        self.load()
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "records path has no parent")
    })?;

    let file_name = path
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("records");
    let tmp_path = parent.join(format!(".{file_name}.{}.tmp", std::process::id()));

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    if let Err(error) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(error);
    }

    Ok(())
}
