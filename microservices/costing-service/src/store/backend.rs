//! Storage backends for the configuration collection
//!
//! A backend only knows how to load and replace the whole collection; all
//! bookkeeping (ids, timestamps, locking) lives in [`super::ConfigurationStore`].

use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::error::{StoreError, StoreResult};
use crate::types::StoredConfiguration;

/// Whole-collection persistence
pub trait ConfigurationBackend: Send + Sync {
    /// Current collection in storage order. A backend with nothing stored yet returns an empty list.
    fn load(&self) -> StoreResult<Vec<StoredConfiguration>>;

    /// Replace the stored collection. Either the new list is fully stored or the old one survives.
    fn persist(&self, records: &[StoredConfiguration]) -> StoreResult<()>;

    /// Human-readable location, used in logs and readiness output
    fn describe(&self) -> String;
}

/// Pretty-printed JSON array in a single file, replaced via temp file + rename
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub const FILE_NAME: &'static str = "configurations.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_dir>/configurations.json`
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode of the file being replaced, or a world-readable default for a new one
    fn target_permissions(&self) -> StoreResult<Option<fs::Permissions>> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta.permissions())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(default_permissions()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl ConfigurationBackend for JsonFileBackend {
    fn load(&self) -> StoreResult<Vec<StoredConfiguration>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    fn persist(&self, records: &[StoredConfiguration]) -> StoreResult<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(&dir, e))?;
        let tmp_path = tmp.path().to_path_buf();
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer
                .write_all(b"\n")
                .and_then(|_| writer.flush())
                .map_err(|e| StoreError::io(&tmp_path, e))?;
        }
        if let Some(permissions) = self.target_permissions()? {
            tmp.as_file()
                .set_permissions(permissions)
                .map_err(|e| StoreError::io(&tmp_path, e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| StoreError::io(&tmp_path, e))?;

        tmp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;
        // the rename has already happened
        if let Err(e) = sync_dir(&dir) {
            warn!(dir = %dir.display(), error = %e, "Failed to sync data directory");
        }

        debug!(path = %self.path.display(), records = records.len(), "Configurations persisted");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

/// Make the rename itself durable
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Process-local collection, lost on restart
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<Vec<StoredConfiguration>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<StoredConfiguration>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl ConfigurationBackend for MemoryBackend {
    fn load(&self) -> StoreResult<Vec<StoredConfiguration>> {
        Ok(self.records.lock().clone())
    }

    fn persist(&self, records: &[StoredConfiguration]) -> StoreResult<()> {
        *self.records.lock() = records.to_vec();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
