//! Agent settings file.
//!
//! ```toml
//! name = "chrony"
//! sources = "nts://time.cloudflare.com?iburst=true, ntp://ntp.ubuntu.com"
//!
//! [[tls_key_pairs]]
//! certificate = "certs/server.crt"
//! key = "certs/server.key"
//!
//! [paths]
//! config_file = "/etc/chrony/chrony.conf"
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::fs;
use std::path::{Path, PathBuf};

use chrony_certs::{TlsKeyPair, CERTS_DIR, SERVICE_USER};
use chrony_config::{CONFIG_BACKUP_FILE, CONFIG_FILE};
use chrony_lock::LOCK_FILE;
use serde::Deserialize;

use crate::error::{AgentError, AgentResult};

/// Default settings location.
pub const SETTINGS_FILE: &str = "/etc/chrony-agent/agent.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Instance identity used for the host lock.
    pub name: String,
    /// Comma-separated source locators.
    #[serde(default)]
    pub sources: String,
    #[serde(default)]
    pub tls_key_pairs: Vec<KeyPairFiles>,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default = "default_service_user")]
    pub service_user: String,
}

/// PEM files for one NTS certificate and its key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeyPairFiles {
    pub certificate: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Paths {
    pub config_file: PathBuf,
    pub backup_file: PathBuf,
    pub certs_dir: PathBuf,
    pub lock_file: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            config_file: CONFIG_FILE.into(),
            backup_file: CONFIG_BACKUP_FILE.into(),
            certs_dir: CERTS_DIR.into(),
            lock_file: LOCK_FILE.into(),
        }
    }
}

fn default_service_user() -> String {
    SERVICE_USER.to_string()
}

impl Settings {
    /// Reads and validates the settings file at `path`.
    pub fn load(path: &Path) -> AgentResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| AgentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parses settings text as if it were read from `origin`.
    pub fn parse(text: &str, origin: &Path) -> AgentResult<Self> {
        let mut settings: Settings = toml::from_str(text).map_err(|source| AgentError::Settings {
            path: origin.to_path_buf(),
            source,
        })?;
        settings.name = settings.name.trim().to_string();
        if settings.name.is_empty() {
            return Err(AgentError::MissingName);
        }
        let base = origin.parent().unwrap_or_else(|| Path::new("."));
        settings.resolve_paths(base);
        Ok(settings)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let paths = &mut self.paths;
        for path in [
            &mut paths.config_file,
            &mut paths.backup_file,
            &mut paths.certs_dir,
            &mut paths.lock_file,
        ] {
            *path = base.join(&*path);
        }
        for pair in &mut self.tls_key_pairs {
            pair.certificate = base.join(&pair.certificate);
            pair.key = base.join(&pair.key);
        }
    }

    /// Loads the configured PEM files.
    pub fn key_pairs(&self) -> AgentResult<Vec<TlsKeyPair>> {
        self.tls_key_pairs
            .iter()
            .map(|files| {
                Ok(TlsKeyPair::new(
                    read_pem(&files.certificate)?,
                    read_pem(&files.key)?,
                ))
            })
            .collect()
    }
}

fn read_pem(path: &Path) -> AgentResult<String> {
    fs::read_to_string(path).map_err(|source| AgentError::Io {
        path: path.to_path_buf(),
        source,
    })
}
