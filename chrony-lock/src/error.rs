//! Error types for the lock manager.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;

#[derive(Debug, Error)]
pub enum LockError {
    /// Release was attempted by an instance that does not hold the lock.
    #[error("{requester} cannot release a lock held by {}", .owner.as_deref().unwrap_or("nobody"))]
    NotOwner {
        requester: String,
        owner: Option<String>,
    },

    /// The instance identity is empty after trimming.
    #[error("instance identity must not be empty")]
    InvalidIdentity,

    /// Reading, creating or removing the marker failed.
    #[error("I/O error on lock marker {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LockError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
