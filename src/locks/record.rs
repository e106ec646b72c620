//! Lock record payload.
//!
//! A record is the UTF-8 string `<host>:<pid>` with no trailing structure.

use crate::config::Config;
use crate::error::{CmdLockError, Result};
use std::fmt;

/// Owner descriptor stored in a lock record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRecord {
    /// Host identifier of the owning process.
    pub host: String,

    /// Process ID of the owning process on `host`.
    pub pid: u32,
}

impl LockRecord {
    pub fn new(host: impl Into<String>, pid: u32) -> Self {
        Self {
            host: host.into(),
            pid,
        }
    }

    /// The descriptor this process writes when it claims a lock.
    ///
    /// The host comes from `host_id` in the config, falling back to the OS
    /// host name.
    pub fn current(config: &Config) -> Result<Self> {
        let host = match &config.host_id {
            Some(host) => host.clone(),
            None => hostname::get()
                .map_err(|e| {
                    CmdLockError::UserError(format!("failed to resolve host name: {}", e))
                })?
                .to_string_lossy()
                .into_owned(),
        };

        Ok(Self::new(host, std::process::id()))
    }

    /// Parse a record payload.
    ///
    /// Returns `None` for payloads without a delimiter, with an empty host,
    /// or with a pid that is not a positive integer.
    pub fn parse(raw: &str) -> Option<Self> {
        let (host, pid) = raw.trim().rsplit_once(':')?;
        if host.is_empty() {
            return None;
        }
        let pid = pid.parse::<u32>().ok().filter(|&pid| pid > 0)?;
        Some(Self::new(host, pid))
    }
}

impl fmt::Display for LockRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.pid)
    }
}
