//! External command lines.

use std::fmt;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{SystemError, SystemResult};

/// A program invocation that can be inspected before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Runs to completion, failing on a non-zero exit.
    pub fn run(&self) -> SystemResult<()> {
        debug!(command = %self, "running");
        let status = Command::new(&self.program)
            .args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .status()
            .map_err(|source| SystemError::Spawn {
                command: self.to_string(),
                source,
            })?;
        if !status.success() {
            return Err(SystemError::CommandFailed {
                command: self.to_string(),
                status,
            });
        }
        Ok(())
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let cmd = CommandLine::new("systemctl").args(["restart", "chrony"]);
        assert_eq!(cmd.to_string(), "systemctl restart chrony");
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = CommandLine::new("/nonexistent/chrony-agent-test-binary")
            .run()
            .unwrap_err();
        assert!(matches!(err, SystemError::Spawn { .. }));
    }

    #[test]
    fn non_zero_exit_is_reported() {
        let err = CommandLine::new("sh").args(["-c", "exit 3"]).run().unwrap_err();
        match err {
            SystemError::CommandFailed { command, status } => {
                assert_eq!(command, "sh -c exit 3");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn successful_command_runs() {
        CommandLine::new("sh").args(["-c", "exit 0"]).run().unwrap();
    }
}
