//! Raw file persistence for the single save slot.
//!
//! RULE: Only the coordinator calls a SlotStore.
//! The store does no locking; the coordinator serializes access.

use crate::error::{StoreError, StoreResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// The byte-level contract the coordinator persists through.
pub trait SlotStore: Send + Sync {
    /// Path of the save file, for diagnostics.
    fn path(&self) -> &Path;

    fn exists(&self) -> bool;

    /// True if the file is missing or has length 0.
    fn is_empty(&self) -> bool;

    fn read_all(&self) -> StoreResult<Vec<u8>>;

    /// Replace the file contents. All-or-nothing: on failure the previous
    /// contents (if any) are left in place.
    fn write_all(&self, bytes: &[u8]) -> StoreResult<()>;

    /// Delete the file. Fails only if the file exists and cannot be removed.
    fn delete(&self) -> StoreResult<()>;

    /// Delete the `<path>.meta` sidecar if one is present.
    fn delete_sidecar(&self) -> StoreResult<()>;
}

/// A SlotStore over one fixed file path.
#[derive(Debug, Clone)]
pub struct RawFileStore {
    path: PathBuf,
}

impl RawFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<path>.meta`
    pub fn sidecar_path(&self) -> PathBuf {
        with_suffix(&self.path, ".meta")
    }

    fn staging_path(&self) -> PathBuf {
        with_suffix(&self.path, ".tmp")
    }
}

impl SlotStore for RawFileStore {
    fn path(&self) -> &Path {
        &self.path
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn is_empty(&self) -> bool {
        match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_)   => true,
        }
    }

    fn read_all(&self) -> StoreResult<Vec<u8>> {
        fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))
    }

    fn write_all(&self, bytes: &[u8]) -> StoreResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
        }
        let staging = self.staging_path();
        fs::write(&staging, bytes).map_err(|e| StoreError::io(&staging, e))?;
        if let Err(e) = fs::rename(&staging, &self.path) {
            let _ = fs::remove_file(&staging);
            return Err(StoreError::io(&self.path, e));
        }
        log::debug!("wrote {} byte(s) to {}", bytes.len(), self.path.display());
        Ok(())
    }

    fn delete(&self) -> StoreResult<()> {
        remove_if_present(&self.path)
    }

    fn delete_sidecar(&self) -> StoreResult<()> {
        remove_if_present(&self.sidecar_path())
    }
}

fn remove_if_present(path: &Path) -> StoreResult<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("deleted {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
