//! chrony management agent.
//!
//! One agent instance per host owns chrony: it installs the packages, writes
//! `/etc/chrony/chrony.conf` from the configured sources, keeps the NTS
//! credentials in place and hands the original configuration back on
//! removal.

mod agent;
mod error;
mod settings;
mod status;

use chrony_certs::FsCredentialBackend;
use chrony_config::FsConfigStore;
use chrony_lock::FsLockStorage;
use chrony_system::{Apt, Systemd};

pub use agent::{Agent, Instance};
pub use error::{AgentError, AgentResult};
pub use settings::{KeyPairFiles, Paths, Settings, SETTINGS_FILE};
pub use status::{AgentStatus, LockReport, UnitStatus};

/// An agent wired to the real host.
pub type HostAgent = Agent<FsConfigStore, FsCredentialBackend, FsLockStorage, Apt, Systemd>;

impl HostAgent {
    /// Builds an agent from settings, loading the configured PEM files.
    pub fn from_settings(settings: &Settings) -> AgentResult<Self> {
        let instance = Instance {
            name: settings.name.clone(),
            sources: settings.sources.clone(),
            key_pairs: settings.key_pairs()?,
        };
        let paths = &settings.paths;
        Ok(Agent::new(
            instance,
            FsConfigStore::new(&paths.config_file, &paths.backup_file),
            FsCredentialBackend::new(&paths.certs_dir, Some(settings.service_user.clone())),
            FsLockStorage::new(&paths.lock_file),
            Apt,
            Systemd,
        ))
    }
}
