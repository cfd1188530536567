//! Error types for the credential store.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for credential store operations.
pub type CertResult<T> = Result<T, CertError>;

/// Errors that can occur while reading or reconciling key pairs.
#[derive(Debug, Error)]
pub enum CertError {
    /// Filesystem error on a credential file or the directory.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The directory does not hold a contiguous run of complete pairs.
    #[error("credential directory is corrupted: {0}")]
    Corrupted(String),

    /// The service account does not exist on this host.
    #[error("unknown service account: {0}")]
    UnknownOwner(String),

    /// Changing ownership of a credential file failed.
    #[error("failed to chown {path}: {source}")]
    Ownership {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    /// More pairs than four-digit slot names can hold.
    #[error("too many key pairs: {0} (at most 10000)")]
    TooManyPairs(usize),
}

impl CertError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
