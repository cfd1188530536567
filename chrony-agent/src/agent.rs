//! Lifecycle operations.

use chrony_certs::{CredentialBackend, CredentialStore, TlsKeyPair};
use chrony_config::{apply_config, is_managed, new_config, ConfigStore, CONFIG_HEADER};
use chrony_lock::{LockManager, LockState, LockStorage};
use chrony_source::parse_sources;
use chrony_system::{chrony, PackageManager, ServiceManager};
use tracing::{info, warn};

use crate::error::AgentResult;
use crate::status::{AgentStatus, UnitStatus};

/// What one agent instance manages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// Identity written into the host lock.
    pub name: String,
    /// Comma-separated source locators.
    pub sources: String,
    pub key_pairs: Vec<TlsKeyPair>,
}

/// One agent instance and the host resources it manages.
///
/// Every mutating operation first takes the host lock under the instance
/// name. An instance that loses the lock reports a conflict and leaves the
/// host alone.
pub struct Agent<C, K, L, P, S> {
    instance: Instance,
    config: C,
    certs: CredentialStore<K>,
    lock: LockManager<L>,
    packages: P,
    services: S,
    transitions: Vec<UnitStatus>,
}

impl<C, K, L, P, S> Agent<C, K, L, P, S>
where
    C: ConfigStore,
    K: CredentialBackend,
    L: LockStorage,
    P: PackageManager,
    S: ServiceManager,
{
    pub fn new(
        instance: Instance,
        config: C,
        certs: K,
        lock: L,
        packages: P,
        services: S,
    ) -> Self {
        Self {
            instance,
            config,
            certs: CredentialStore::new(certs),
            lock: LockManager::new(lock),
            packages,
            services,
            transitions: Vec::new(),
        }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn config_store(&self) -> &C {
        &self.config
    }

    pub fn credentials(&self) -> &CredentialStore<K> {
        &self.certs
    }

    pub fn lock(&self) -> &LockManager<L> {
        &self.lock
    }

    pub fn packages(&self) -> &P {
        &self.packages
    }

    pub fn services(&self) -> &S {
        &self.services
    }

    /// Every status set so far, oldest first.
    pub fn transitions(&self) -> &[UnitStatus] {
        &self.transitions
    }

    fn set_status(&mut self, status: UnitStatus) -> UnitStatus {
        info!(name = %self.instance.name, %status, "status changed");
        self.transitions.push(status.clone());
        status
    }

    /// Installs chrony if needed and brings its configuration in line with
    /// the instance settings.
    ///
    /// Runs for install, upgrade and settings changes alike.
    pub fn install_and_configure(&mut self) -> AgentResult<UnitStatus> {
        if !self.lock.try_acquire(&self.instance.name)? {
            let status = UnitStatus::conflict(&self.instance.name);
            return Ok(self.set_status(status));
        }
        if !chrony::is_installed(&self.packages) {
            self.set_status(UnitStatus::Maintenance("installing chrony".to_string()));
            chrony::install(&self.packages)?;
        }
        self.configure()
    }

    fn configure(&mut self) -> AgentResult<UnitStatus> {
        let sources = match parse_sources(&self.instance.sources) {
            Ok(sources) => sources,
            Err(e) => {
                warn!(error = %e, "rejected sources");
                let status = UnitStatus::Blocked("invalid sources configuration".to_string());
                return Ok(self.set_status(status));
            }
        };
        if sources.is_empty() {
            let status = UnitStatus::Blocked("no time source configured".to_string());
            return Ok(self.set_status(status));
        }

        self.certs.write(&self.instance.key_pairs)?;

        if !is_managed(&self.config.read()?) {
            self.config.backup()?;
        }
        let config = new_config(&sources, CONFIG_HEADER)?;
        if apply_config(&self.config, &config)? {
            info!("chrony config changed, restarting chrony");
            chrony::restart(&self.services)?;
        }
        Ok(self.set_status(UnitStatus::Active))
    }

    /// Hands the host back: removes the exporter, restores the original
    /// configuration and releases the lock.
    ///
    /// Returns false, with a conflict status set, when another instance owns
    /// the host. A release that fails after teardown is returned as an error.
    pub fn remove(&mut self) -> AgentResult<bool> {
        if !self.lock.try_acquire(&self.instance.name)? {
            let status = UnitStatus::conflict(&self.instance.name);
            self.set_status(status);
            return Ok(false);
        }
        chrony::uninstall(&self.packages)?;
        self.config.restore()?;
        chrony::restart(&self.services)?;
        self.lock.release(&self.instance.name)?;
        info!(name = %self.instance.name, "chrony handed back");
        Ok(true)
    }

    /// Generates the configuration this instance would write, touching
    /// nothing.
    pub fn render(&self) -> AgentResult<String> {
        let sources = parse_sources(&self.instance.sources)?;
        Ok(new_config(&sources, CONFIG_HEADER)?)
    }

    pub fn status(&self) -> AgentResult<AgentStatus> {
        let lock = self.lock.state(&self.instance.name)?;
        Ok(AgentStatus {
            name: self.instance.name.clone(),
            lock: lock.into(),
            installed: chrony::is_installed(&self.packages),
            managed: self.config.read().ok().map(|text| is_managed(&text)),
            has_backup: self.config.has_backup().ok(),
            metrics_endpoint: format!(
                "*:{}{}",
                chrony::EXPORTER_PORT,
                chrony::EXPORTER_PATH
            ),
        })
    }

    /// True if this instance currently owns the host.
    pub fn is_owner(&self) -> AgentResult<bool> {
        Ok(self.lock.state(&self.instance.name)? == LockState::OwnedBySelf)
    }
}
