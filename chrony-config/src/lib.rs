//! chrony configuration for the agent.
//!
//! Generated files have three parts separated by a blank line:
//!
//! ```text
//! # This is managed by chrony-agent.
//! # Do not edit.
//!
//! pool ntp.ubuntu.com iburst maxsources 4
//! pool 0.ubuntu.pool.ntp.org iburst maxsources 1
//!
//! sourcedir /run/chrony-dhcp
//! ...
//! leapsectz right/UTC
//! ```
//!
//! The live file is only rewritten when the generated text differs from it,
//! and the first write over an unmanaged file saves that file so removal can
//! put it back.

mod assemble;
mod error;
mod store;

pub use assemble::{is_managed, needs_reload, new_config, CONFIG_HEADER, STATIC_CONFIG};
pub use error::{ConfigError, ConfigResult};
pub use store::{
    apply_config, BackupOutcome, ConfigStore, FsConfigStore, MemoryConfigStore, RestoreOutcome,
    CONFIG_BACKUP_FILE, CONFIG_FILE,
};
