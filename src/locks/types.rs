//! Lock state assessment and information structures.

use super::liveness::process_group_exists;
use super::record::LockRecord;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// Assessed state of an existing lock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Owned by a live process on this host.
    Active,
    /// Owned by another host. Liveness cannot be checked, so it is honored.
    Foreign,
    /// Owned by a process on this host that no longer exists.
    Stale,
    /// The payload is not a `host:pid` descriptor.
    Malformed,
}

impl LockState {
    /// Assess a raw record payload from the point of view of `local_host`.
    pub fn assess(raw: &str, local_host: &str) -> (Option<LockRecord>, Self) {
        let Some(record) = LockRecord::parse(raw) else {
            return (None, LockState::Malformed);
        };

        let state = if record.host != local_host {
            LockState::Foreign
        } else if process_group_exists(record.pid) {
            LockState::Active
        } else {
            LockState::Stale
        };

        (Some(record), state)
    }

    /// Whether a record in this state makes `acquire` fail.
    pub fn blocks_acquire(&self) -> bool {
        matches!(self, LockState::Active | LockState::Foreign)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LockState::Active => "active",
            LockState::Foreign => "foreign",
            LockState::Stale => "stale",
            LockState::Malformed => "malformed",
        }
    }
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Information about a lock record found on disk.
#[derive(Debug, Clone)]
pub struct LockInfo {
    /// The lock record path.
    pub path: PathBuf,

    /// The sanitized command name (the record's file stem).
    pub name: String,

    /// The raw owner descriptor, trimmed.
    pub owner: String,

    /// The parsed owner, if the payload is well formed.
    pub record: Option<LockRecord>,

    /// The assessed state.
    pub state: LockState,

    /// Last modification time of the record, if the filesystem reports one.
    pub modified: Option<DateTime<Utc>>,
}

impl LockInfo {
    /// Format the record's age as a human-readable string.
    pub fn age_string(&self) -> String {
        let Some(modified) = self.modified else {
            return "unknown".to_string();
        };

        let age = Utc::now().signed_duration_since(modified);
        let minutes = age.num_minutes().max(0);
        let hours = age.num_hours().max(0);
        let days = age.num_days().max(0);

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }
}

impl fmt::Display for LockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (owner: {}, age: {}, {})",
            self.name,
            if self.owner.is_empty() {
                "<empty>"
            } else {
                self.owner.as_str()
            },
            self.age_string(),
            self.state
        )
    }
}

/// How a protected command finished, as reported on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command exited with this code.
    Exited(i32),
    /// The command was terminated by this signal.
    Signaled(i32),
    /// The command could not be started.
    NotStarted,
}

impl CommandOutcome {
    /// Convert a child's exit status.
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        match (status.code(), status.signal()) {
            (Some(code), _) => CommandOutcome::Exited(code),
            (None, Some(signal)) => CommandOutcome::Signaled(signal),
            (None, None) => CommandOutcome::NotStarted,
        }
    }

    /// Exit code a wrapper should report for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandOutcome::Exited(code) => *code,
            CommandOutcome::Signaled(signal) => crate::exit_codes::SIGNAL_BASE + signal,
            CommandOutcome::NotStarted => crate::exit_codes::SPAWN_FAILURE,
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Exited(code) => write!(f, "exited with code {}", code),
            CommandOutcome::Signaled(signal) => write!(f, "terminated by signal {}", signal),
            CommandOutcome::NotStarted => write!(f, "not started"),
        }
    }
}
