use std::process::ExitStatus;
use thiserror::Error;

pub type SystemResult<T> = Result<T, SystemError>;

/// Errors from external system commands.
#[derive(Debug, Error)]
pub enum SystemError {
    /// The program could not be started.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully.
    #[error("`{command}` failed with {status}")]
    CommandFailed { command: String, status: ExitStatus },
}
