//! Package and service managers.

use std::ffi::OsStr;
use std::sync::{Mutex, PoisonError};

use tracing::info;

use crate::command::CommandLine;
use crate::error::SystemResult;

/// Installs and removes distribution packages.
pub trait PackageManager {
    fn add_repository(&self, repository: &str) -> SystemResult<()>;

    fn install(&self, packages: &[&str]) -> SystemResult<()>;

    fn remove(&self, packages: &[&str]) -> SystemResult<()>;

    /// True if every binary is found on `PATH`.
    fn is_installed(&self, binaries: &[&str]) -> bool {
        binaries.iter().all(|bin| which::which(bin).is_ok())
    }
}

/// Restarts system services.
pub trait ServiceManager {
    fn restart(&self, service: &str) -> SystemResult<()>;
}

/// True if an executable named `binary` exists in one of the `path` entries.
pub fn find_in_path(binary: &str, path: &OsStr) -> bool {
    which::which_in(binary, Some(path), "/").is_ok()
}

/// Debian/Ubuntu packages through apt.
#[derive(Debug, Clone, Copy, Default)]
pub struct Apt;

impl Apt {
    pub fn add_repository_commands(repository: &str) -> Vec<CommandLine> {
        vec![
            CommandLine::new("add-apt-repository").args(["-y", repository]),
            apt_get().arg("update"),
        ]
    }

    pub fn install_command(packages: &[&str]) -> CommandLine {
        apt_get().args(["install", "-y"]).args(packages.iter().copied())
    }

    pub fn remove_command(packages: &[&str]) -> CommandLine {
        apt_get().args(["remove", "-y"]).args(packages.iter().copied())
    }
}

fn apt_get() -> CommandLine {
    CommandLine::new("apt-get").env("DEBIAN_FRONTEND", "noninteractive")
}

impl PackageManager for Apt {
    fn add_repository(&self, repository: &str) -> SystemResult<()> {
        for cmd in Self::add_repository_commands(repository) {
            cmd.run()?;
        }
        info!(repository, "added package repository");
        Ok(())
    }

    fn install(&self, packages: &[&str]) -> SystemResult<()> {
        Self::install_command(packages).run()?;
        info!(?packages, "installed packages");
        Ok(())
    }

    fn remove(&self, packages: &[&str]) -> SystemResult<()> {
        Self::remove_command(packages).run()?;
        info!(?packages, "removed packages");
        Ok(())
    }
}

/// Services managed by systemd.
#[derive(Debug, Clone, Copy, Default)]
pub struct Systemd;

impl Systemd {
    pub fn restart_command(service: &str) -> CommandLine {
        CommandLine::new("systemctl").args(["restart", service])
    }
}

impl ServiceManager for Systemd {
    fn restart(&self, service: &str) -> SystemResult<()> {
        Self::restart_command(service).run()?;
        info!(service, "restarted service");
        Ok(())
    }
}

/// Package manager that only records what it was asked to do.
///
/// `is_installed` reports true after any install and false after any
/// removal, so lifecycle code can be driven without a real host.
#[derive(Debug, Default)]
pub struct RecordingPackages {
    calls: Mutex<Vec<String>>,
    installed: Mutex<bool>,
}

impl RecordingPackages {
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager that starts out with everything installed.
    pub fn installed() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            installed: Mutex::new(true),
        }
    }

    /// Every call so far, as `"<op> <args>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    fn set_installed(&self, value: bool) {
        *self.installed.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

impl PackageManager for RecordingPackages {
    fn add_repository(&self, repository: &str) -> SystemResult<()> {
        self.record(format!("add-repository {repository}"));
        Ok(())
    }

    fn install(&self, packages: &[&str]) -> SystemResult<()> {
        self.record(format!("install {}", packages.join(" ")));
        self.set_installed(true);
        Ok(())
    }

    fn remove(&self, packages: &[&str]) -> SystemResult<()> {
        self.record(format!("remove {}", packages.join(" ")));
        self.set_installed(false);
        Ok(())
    }

    fn is_installed(&self, _binaries: &[&str]) -> bool {
        *self.installed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Service manager that records restarts.
#[derive(Debug, Default)]
pub struct RecordingServices {
    restarts: Mutex<Vec<String>>,
}

impl RecordingServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restarts(&self) -> Vec<String> {
        self.restarts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ServiceManager for RecordingServices {
    fn restart(&self, service: &str) -> SystemResult<()> {
        self.restarts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(service.to_string());
        Ok(())
    }
}
