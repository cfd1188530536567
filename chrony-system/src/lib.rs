//! Host integration for the chrony agent.
//!
//! Packages are managed with apt and the daemon with systemd. Both sit behind
//! traits so the lifecycle code can run against the recording fakes.

pub mod chrony;
mod command;
mod error;
mod manager;

pub use command::CommandLine;
pub use error::{SystemError, SystemResult};
pub use manager::{
    find_in_path, Apt, PackageManager, RecordingPackages, RecordingServices, ServiceManager,
    Systemd,
};
