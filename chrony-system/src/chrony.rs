//! The chrony package set.

use tracing::info;

use crate::error::SystemResult;
use crate::manager::{PackageManager, ServiceManager};

/// Repository carrying the exporter package.
pub const REPOSITORY: &str = "ppa:canonical-is-devops/chrony-charm";
/// Packages installed together.
pub const PACKAGES: &[&str] = &["chrony", "ca-certificates", "prometheus-chrony-exporter"];
/// Packages removed on teardown. chrony itself stays.
pub const REMOVED_PACKAGES: &[&str] = &["prometheus-chrony-exporter"];
/// Binaries whose presence means the set is installed.
pub const BINARIES: &[&str] = &["chronyc", "chrony_exporter"];
pub const SERVICE: &str = "chrony";

/// Port the metrics exporter listens on.
pub const EXPORTER_PORT: u16 = 9123;
pub const EXPORTER_PATH: &str = "/metrics";

pub fn is_installed(packages: &impl PackageManager) -> bool {
    packages.is_installed(BINARIES)
}

/// Adds the repository and installs the package set.
pub fn install(packages: &impl PackageManager) -> SystemResult<()> {
    packages.add_repository(REPOSITORY)?;
    packages.install(PACKAGES)?;
    info!("chrony installed");
    Ok(())
}

pub fn uninstall(packages: &impl PackageManager) -> SystemResult<()> {
    packages.remove(REMOVED_PACKAGES)?;
    info!("chrony exporter removed");
    Ok(())
}

pub fn restart(services: &impl ServiceManager) -> SystemResult<()> {
    services.restart(SERVICE)
}
