//! Error types for configuration assembly and storage.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while building or storing chrony configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Assembly was attempted with an empty source list.
    #[error("no time sources provided")]
    NoSources,

    /// Filesystem error on one of the configuration files.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
