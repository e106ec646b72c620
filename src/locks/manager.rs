//! Per-process lock manager: acquire, release, and shutdown cleanup.

use super::operations::{
    create_record, inspect_lock, lock_path, read_record, reclaim_record, record_path, remove_record,
};
use super::record::LockRecord;
use super::types::{CommandOutcome, LockInfo, LockState};
use crate::config::Config;
use crate::error::{CmdLockError, Result};
use crate::shutdown;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of a successful [`LockManager::acquire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// The command is in the exclusion set. Nothing was written and there is
    /// nothing to release.
    Excluded,

    /// A record was created at `path`.
    Locked {
        path: PathBuf,
        /// Owner descriptor of a stale or malformed record that was replaced.
        reclaimed: Option<String>,
    },
}

/// Owns the lock records this process holds.
///
/// One manager per process. Other processes are coordinated with only
/// through the records in the lock directory.
///
/// Records still held when the manager is dropped are removed.
#[derive(Debug)]
pub struct LockManager {
    lock_dir: PathBuf,
    exclude: BTreeSet<String>,
    owner: LockRecord,
    /// Command name to the record path it holds.
    held: BTreeMap<String, PathBuf>,
}

impl LockManager {
    /// Create a manager identifying itself as this host and process.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_owner(config, LockRecord::current(config)?))
    }

    /// Create a manager with an explicit owner descriptor.
    pub fn with_owner(config: &Config, owner: LockRecord) -> Self {
        Self {
            lock_dir: config.lock_dir.clone(),
            exclude: config.exclude.clone(),
            owner,
            held: BTreeMap::new(),
        }
    }

    /// Whether `command` bypasses locking.
    pub fn is_excluded(&self, command: &str) -> bool {
        self.exclude.contains(command)
    }

    /// Path of the record for `command`.
    pub fn lock_path(&self, command: &str) -> PathBuf {
        lock_path(&self.lock_dir, command)
    }

    /// Path of the record held for `command`, if this manager holds one.
    #[cfg(test)]
    pub fn held_path(&self, command: &str) -> Option<&Path> {
        self.held.get(command).map(PathBuf::as_path)
    }

    /// Claim the lock for `command`.
    ///
    /// # Returns
    ///
    /// * `Ok(Acquisition::Excluded)` - The command bypasses locking
    /// * `Ok(Acquisition::Locked { .. })` - Record created and scheduled for
    ///   removal at exit
    /// * `Err(CmdLockError::UserError)` - The name sanitizes to nothing
    /// * `Err(CmdLockError::AlreadyRunning)` - A live local owner, or any
    ///   owner on another host, holds the lock
    /// * `Err(CmdLockError::StorageError)` - The record could not be read,
    ///   reclaimed or written
    pub fn acquire(&mut self, command: &str) -> Result<Acquisition> {
        if self.is_excluded(command) {
            debug!(command, "command is excluded from locking");
            return Ok(Acquisition::Excluded);
        }

        let path = record_path(&self.lock_dir, command)?;
        let mut reclaimed = None;

        if let Some(raw) = read_record(&path)? {
            let (_, state) = LockState::assess(&raw, &self.owner.host);
            if state.blocks_acquire() {
                return Err(already_running(command, &raw));
            }

            warn!(
                command,
                owner = raw.trim(),
                %state,
                path = %path.display(),
                "reclaiming stale lock"
            );
            // Only delete the record that was assessed
            if let Some(current) = reclaim_record(&path, &raw)? {
                return Err(already_running(command, &current));
            }
            reclaimed = Some(raw.trim().to_string());
        }

        if !create_record(&path, &self.owner)? {
            // Another claimer created the record after our check
            let raw = read_record(&path)?.unwrap_or_default();
            return Err(already_running(command, &raw));
        }

        self.held.insert(command.to_string(), path.clone());
        shutdown::register(&path);

        info!(command, owner = %self.owner, path = %path.display(), "lock acquired");
        Ok(Acquisition::Locked { path, reclaimed })
    }

    /// Release the lock held for `command` after it finished.
    ///
    /// Returns whether a record was removed. Releasing a command that holds
    /// no lock, or whose record is already gone, is a no-op.
    pub fn release(&mut self, command: &str, outcome: &CommandOutcome) -> Result<bool> {
        let Some(path) = self.held.get(command).cloned() else {
            debug!(command, %outcome, "no lock held, nothing to release");
            return Ok(false);
        };

        let removed = remove_record(&path)?;
        self.held.remove(command);
        shutdown::deregister(&path);

        info!(command, %outcome, path = %path.display(), "lock released");
        Ok(removed)
    }

    /// Remove held records on termination.
    ///
    /// With an explicit path only that record is removed; otherwise every
    /// record this manager holds. Safe to call after `release`.
    pub fn shutdown_cleanup(&mut self, explicit_path: Option<&Path>) -> Result<usize> {
        let targets: Vec<PathBuf> = match explicit_path {
            Some(path) => vec![path.to_path_buf()],
            None => self.held.values().cloned().collect(),
        };

        let mut removed = 0;
        for path in targets {
            if remove_record(&path)? {
                removed += 1;
            }
            self.held.retain(|_, held| held != &path);
            shutdown::deregister(&path);
        }

        Ok(removed)
    }

    /// The record that would make `acquire(command)` fail right now, if any.
    ///
    /// Nothing is written or reclaimed.
    pub fn check(&self, command: &str) -> Result<Option<LockInfo>> {
        if self.is_excluded(command) {
            return Ok(None);
        }

        let info = inspect_lock(&record_path(&self.lock_dir, command)?, &self.owner.host)?;
        Ok(info.filter(|info| info.state.blocks_acquire()))
    }
}

impl Drop for LockManager {
    fn drop(&mut self) {
        if self.held.is_empty() {
            return;
        }
        if let Err(e) = self.shutdown_cleanup(None) {
            warn!("failed to release held locks: {}", e);
        }
    }
}

fn already_running(command: &str, raw: &str) -> CmdLockError {
    CmdLockError::AlreadyRunning {
        command: command.to_string(),
        owner: raw.trim().to_string(),
    }
}
