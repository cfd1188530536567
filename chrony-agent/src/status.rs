use std::fmt;

use chrony_lock::LockState;
use serde::Serialize;

/// Workload status reported after each lifecycle operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum UnitStatus {
    /// Work is in progress.
    Maintenance(String),
    /// The agent cannot proceed until an operator acts.
    Blocked(String),
    Active,
}

impl UnitStatus {
    pub(crate) fn conflict(name: &str) -> Self {
        Self::Blocked(format!(
            "conflict: multiple chrony agents detected, remove the instance '{name}'"
        ))
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Maintenance(msg) => write!(f, "maintenance: {msg}"),
            Self::Blocked(msg) => write!(f, "blocked: {msg}"),
            Self::Active => f.write_str("active"),
        }
    }
}

/// Lock ownership as reported by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockReport {
    Unowned,
    OwnedBySelf,
    OwnedByOther { owner: String },
}

impl From<LockState> for LockReport {
    fn from(state: LockState) -> Self {
        match state {
            LockState::Unowned => Self::Unowned,
            LockState::OwnedBySelf => Self::OwnedBySelf,
            LockState::OwnedByOther(owner) => Self::OwnedByOther { owner },
        }
    }
}

/// Read-only snapshot of the host as seen by this instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStatus {
    pub name: String,
    pub lock: LockReport,
    pub installed: bool,
    /// Whether the live configuration carries the agent header. `None` if
    /// it could not be read.
    pub managed: Option<bool>,
    pub has_backup: Option<bool>,
    pub metrics_endpoint: String,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lock = match &self.lock {
            LockReport::Unowned => "unowned".to_string(),
            LockReport::OwnedBySelf => "held by this instance".to_string(),
            LockReport::OwnedByOther { owner } => format!("held by {owner}"),
        };
        let flag = |v: Option<bool>| match v {
            Some(true) => "yes",
            Some(false) => "no",
            None => "unknown",
        };
        writeln!(f, "name:       {}", self.name)?;
        writeln!(f, "lock:       {lock}")?;
        writeln!(f, "installed:  {}", if self.installed { "yes" } else { "no" })?;
        writeln!(f, "managed:    {}", flag(self.managed))?;
        writeln!(f, "backup:     {}", flag(self.has_backup))?;
        write!(f, "metrics:    {}", self.metrics_endpoint)
    }
}
