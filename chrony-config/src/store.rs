//! Live configuration file and its single-slot backup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use crate::error::{ConfigError, ConfigResult};

/// Default location of the live chrony configuration.
pub const CONFIG_FILE: &str = "/etc/chrony/chrony.conf";
/// Default location of the pre-management backup.
pub const CONFIG_BACKUP_FILE: &str = "/var/lib/chrony/chrony.conf.bak";

/// What [`ConfigStore::backup`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupOutcome {
    /// The live configuration was copied into the backup slot.
    Saved,
    /// A backup already existed and was kept.
    AlreadyExists,
}

/// What [`ConfigStore::restore`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// The backup was written back and the slot cleared.
    Restored,
    /// There was no backup to restore.
    NoBackup,
}

/// Storage for the live configuration and one backup snapshot.
///
/// Implementors provide the five primitives; `backup` and `restore` are
/// built on top of them and keep the save-once / restore-and-clear rules.
pub trait ConfigStore {
    /// Reads the live configuration.
    fn read(&self) -> ConfigResult<String>;

    /// Replaces the live configuration. Readers never see a partial file.
    fn write(&self, config: &str) -> ConfigResult<()>;

    /// Reads the backup slot, `None` if empty.
    fn read_backup(&self) -> ConfigResult<Option<String>>;

    /// Fills the backup slot.
    fn write_backup(&self, config: &str) -> ConfigResult<()>;

    /// Empties the backup slot.
    fn clear_backup(&self) -> ConfigResult<()>;

    fn has_backup(&self) -> ConfigResult<bool> {
        Ok(self.read_backup()?.is_some())
    }

    /// Saves the live configuration unless a backup already exists.
    ///
    /// An existing backup holds the original pre-management file and is
    /// never overwritten.
    fn backup(&self) -> ConfigResult<BackupOutcome> {
        if self.has_backup()? {
            warn!("failed to backup configuration file: backup already exists");
            return Ok(BackupOutcome::AlreadyExists);
        }
        self.write_backup(&self.read()?)?;
        info!("saved original chrony configuration");
        Ok(BackupOutcome::Saved)
    }

    /// Writes the backup back to the live file and clears the slot.
    fn restore(&self) -> ConfigResult<RestoreOutcome> {
        let Some(original) = self.read_backup()? else {
            warn!("failed to restore configuration file from backup: no backup");
            return Ok(RestoreOutcome::NoBackup);
        };
        self.write(&original)?;
        self.clear_backup()?;
        info!("restored original chrony configuration");
        Ok(RestoreOutcome::Restored)
    }
}

/// Writes `config` if it differs from the live file. Returns true if it wrote.
pub fn apply_config(store: &impl ConfigStore, config: &str) -> ConfigResult<bool> {
    let current = store.read()?;
    if !crate::needs_reload(config, &current) {
        return Ok(false);
    }
    store.write(config)?;
    info!("chrony configuration changed");
    Ok(true)
}

/// Configuration store backed by files on disk.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    config_file: PathBuf,
    backup_file: PathBuf,
}

impl FsConfigStore {
    pub fn new(config_file: impl Into<PathBuf>, backup_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            backup_file: backup_file.into(),
        }
    }

    #[must_use]
    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    #[must_use]
    pub fn backup_file(&self) -> &Path {
        &self.backup_file
    }
}

impl Default for FsConfigStore {
    fn default() -> Self {
        Self::new(CONFIG_FILE, CONFIG_BACKUP_FILE)
    }
}

impl ConfigStore for FsConfigStore {
    fn read(&self) -> ConfigResult<String> {
        fs::read_to_string(&self.config_file).map_err(|e| ConfigError::io(&self.config_file, e))
    }

    fn write(&self, config: &str) -> ConfigResult<()> {
        write_atomic(&self.config_file, config)
    }

    fn read_backup(&self) -> ConfigResult<Option<String>> {
        match fs::read_to_string(&self.backup_file) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::io(&self.backup_file, e)),
        }
    }

    fn write_backup(&self, config: &str) -> ConfigResult<()> {
        if let Some(parent) = self.backup_file.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }
        write_atomic(&self.backup_file, config)
    }

    fn clear_backup(&self) -> ConfigResult<()> {
        match fs::remove_file(&self.backup_file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfigError::io(&self.backup_file, e)),
        }
    }
}

/// Writes a sibling temporary file and renames it over `path`.
///
/// The permissions of an existing target are carried over.
fn write_atomic(path: &Path, content: &str) -> ConfigResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = parent.join(format!(".{name}.tmp.{}", std::process::id()));
    fs::write(&tmp, content).map_err(|e| ConfigError::io(&tmp, e))?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(&tmp, meta.permissions()).map_err(|e| ConfigError::io(&tmp, e))?;
    }
    // Atomic replace on POSIX.
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(ConfigError::io(path, e));
    }
    Ok(())
}

/// In-memory configuration store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: Mutex<Option<String>>,
    backup: Mutex<Option<String>>,
}

impl MemoryConfigStore {
    /// Creates a store whose live file holds `config`.
    pub fn with_config(config: impl Into<String>) -> Self {
        Self {
            config: Mutex::new(Some(config.into())),
            backup: Mutex::new(None),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn read(&self) -> ConfigResult<String> {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| {
                ConfigError::io(
                    CONFIG_FILE,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no configuration"),
                )
            })
    }

    fn write(&self, config: &str) -> ConfigResult<()> {
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = Some(config.to_string());
        Ok(())
    }

    fn read_backup(&self) -> ConfigResult<Option<String>> {
        Ok(self.backup.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn write_backup(&self, config: &str) -> ConfigResult<()> {
        *self.backup.lock().unwrap_or_else(PoisonError::into_inner) = Some(config.to_string());
        Ok(())
    }

    fn clear_backup(&self) -> ConfigResult<()> {
        *self.backup.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
