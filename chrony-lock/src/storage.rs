//! Where the lock marker lives.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::{LockError, LockResult};

/// Default marker location.
pub const LOCK_FILE: &str = "/var/lib/chrony-agent/lock";

/// Persistent slot holding the owner's identity.
pub trait LockStorage {
    /// Returns the stored identity, `None` when no marker exists.
    fn read(&self) -> LockResult<Option<String>>;

    /// Stores `identity` only if no marker exists. Returns true if this call
    /// created the marker.
    fn create(&self, identity: &str) -> LockResult<bool>;

    /// Deletes the marker. Missing markers are not an error.
    fn remove(&self) -> LockResult<()>;
}

/// Marker file on the local filesystem.
///
/// Creation uses `O_EXCL` so two instances racing on an absent marker cannot
/// both win. Removal also deletes the containing directory once it is
/// empty.
#[derive(Debug, Clone)]
pub struct FsLockStorage {
    path: PathBuf,
}

impl FsLockStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FsLockStorage {
    fn default() -> Self {
        Self::new(LOCK_FILE)
    }
}

impl LockStorage for FsLockStorage {
    fn read(&self) -> LockResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LockError::io(&self.path, e)),
        }
    }

    fn create(&self, identity: &str) -> LockResult<bool> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| LockError::io(parent, e))?;
        }
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(LockError::io(&self.path, e)),
        };
        file.write_all(identity.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| LockError::io(&self.path, e))?;
        Ok(true)
    }

    fn remove(&self) -> LockResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(LockError::io(&self.path, e)),
        }
        // Only an emptied directory goes; anything else sharing it stays.
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            match fs::remove_dir(parent) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => debug!(dir = %parent.display(), error = %e, "kept lock directory"),
            }
        }
        Ok(())
    }
}

/// In-memory marker for tests.
#[derive(Debug, Default)]
pub struct MemoryLockStorage {
    owner: Mutex<Option<String>>,
}

impl MemoryLockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds a marker for `identity`.
    pub fn held_by(identity: impl Into<String>) -> Self {
        Self {
            owner: Mutex::new(Some(identity.into())),
        }
    }
}

impl LockStorage for MemoryLockStorage {
    fn read(&self) -> LockResult<Option<String>> {
        Ok(self.owner.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn create(&self, identity: &str) -> LockResult<bool> {
        let mut owner = self.owner.lock().unwrap_or_else(PoisonError::into_inner);
        if owner.is_some() {
            return Ok(false);
        }
        *owner = Some(identity.to_string());
        Ok(true)
    }

    fn remove(&self) -> LockResult<()> {
        *self.owner.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
