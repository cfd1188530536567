//! Error types for the lifecycle shell.

use std::path::PathBuf;
use thiserror::Error;

use chrony_certs::CertError;
use chrony_config::ConfigError;
use chrony_lock::LockError;
use chrony_source::SourceError;
use chrony_system::SystemError;

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid agent settings in {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The instance name is empty after trimming.
    #[error("agent name must not be empty")]
    MissingName,

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Certs(#[from] CertError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    System(#[from] SystemError),
}
