//! Storage backends for credential files.
//!
//! A backend exposes a flat directory of named text files. The store on top
//! decides which names mean what.

use std::collections::BTreeMap;
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use nix::unistd::{chown, Gid, Group, Uid, User};
use tracing::debug;

use crate::error::{CertError, CertResult};

/// Default credential directory.
pub const CERTS_DIR: &str = "/etc/chrony/certs";
/// Account that chronyd reads credentials as.
pub const SERVICE_USER: &str = "_chrony";

const DIR_MODE: u32 = 0o700;
const FILE_MODE: u32 = 0o600;

/// A flat directory of credential files.
pub trait CredentialBackend {
    /// Ensures the directory exists with its expected mode and owner.
    fn prepare(&self) -> CertResult<()>;

    /// Names of all entries in the directory.
    fn list(&self) -> CertResult<Vec<String>>;

    fn read(&self, name: &str) -> CertResult<String>;

    /// Creates or replaces a file. Readers never see partial content.
    fn write(&self, name: &str, content: &str) -> CertResult<()>;

    fn remove(&self, name: &str) -> CertResult<()>;
}

/// Credential files on the local filesystem.
///
/// The directory is kept at mode 0700 and every file at 0600. With an owner
/// configured, both are chowned to that account whenever they are created or
/// rewritten.
#[derive(Debug, Clone)]
pub struct FsCredentialBackend {
    dir: PathBuf,
    owner: Option<String>,
}

impl FsCredentialBackend {
    /// Backend rooted at `dir`, owned by `owner` if given.
    pub fn new(dir: impl Into<PathBuf>, owner: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            owner,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn owner_ids(&self) -> CertResult<Option<(Uid, Gid)>> {
        let Some(name) = &self.owner else {
            return Ok(None);
        };
        let user = User::from_name(name)
            .ok()
            .flatten()
            .ok_or_else(|| CertError::UnknownOwner(name.clone()))?;
        let group = Group::from_name(name)
            .ok()
            .flatten()
            .map_or(user.gid, |g| g.gid);
        Ok(Some((user.uid, group)))
    }

    fn apply_owner(&self, path: &Path) -> CertResult<()> {
        if let Some((uid, gid)) = self.owner_ids()? {
            chown(path, Some(uid), Some(gid)).map_err(|source| CertError::Ownership {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

impl Default for FsCredentialBackend {
    fn default() -> Self {
        Self::new(CERTS_DIR, Some(SERVICE_USER.to_string()))
    }
}

impl CredentialBackend for FsCredentialBackend {
    fn prepare(&self) -> CertResult<()> {
        if !self.dir.is_dir() {
            DirBuilder::new()
                .recursive(true)
                .mode(DIR_MODE)
                .create(&self.dir)
                .map_err(|e| CertError::io(&self.dir, e))?;
            debug!(dir = %self.dir.display(), "created credential directory");
        }
        fs::set_permissions(&self.dir, fs::Permissions::from_mode(DIR_MODE))
            .map_err(|e| CertError::io(&self.dir, e))?;
        self.apply_owner(&self.dir)
    }

    fn list(&self) -> CertResult<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| CertError::io(&self.dir, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CertError::io(&self.dir, e))?;
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, name: &str) -> CertResult<String> {
        let path = self.dir.join(name);
        fs::read_to_string(&path).map_err(|e| CertError::io(&path, e))
    }

    fn write(&self, name: &str, content: &str) -> CertResult<()> {
        let path = self.dir.join(name);
        let tmp = self.dir.join(format!(".{name}.tmp.{}", std::process::id()));

        let written = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(FILE_MODE)
            .open(&tmp)
            .and_then(|mut file| {
                file.write_all(content.as_bytes())?;
                file.sync_all()
            })
            .and_then(|()| fs::set_permissions(&tmp, fs::Permissions::from_mode(FILE_MODE)));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(CertError::io(&tmp, e));
        }
        if let Err(e) = self.apply_owner(&tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(CertError::io(&path, e));
        }
        Ok(())
    }

    fn remove(&self, name: &str) -> CertResult<()> {
        let path = self.dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CertError::io(&path, e)),
        }
    }
}

/// In-memory credential directory for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryCredentialBackend {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemoryCredentialBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every file, keyed by name.
    pub fn files(&self) -> BTreeMap<String, String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CredentialBackend for MemoryCredentialBackend {
    fn prepare(&self) -> CertResult<()> {
        Ok(())
    }

    fn list(&self) -> CertResult<Vec<String>> {
        Ok(self
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect())
    }

    fn read(&self, name: &str) -> CertResult<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| {
                CertError::io(
                    name,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such credential file"),
                )
            })
    }

    fn write(&self, name: &str, content: &str) -> CertResult<()> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), content.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> CertResult<()> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        Ok(())
    }
}
