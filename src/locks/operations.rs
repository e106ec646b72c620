//! Lock record storage, listing, and clearing operations.

use super::record::LockRecord;
use super::sanitize::sanitize;
use super::types::{LockInfo, LockState};
use crate::error::{CmdLockError, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File extension of lock records.
pub const RECORD_EXTENSION: &str = "pid";

/// Path of the lock record for `command` inside `lock_dir`.
pub fn lock_path(lock_dir: &Path, command: &str) -> PathBuf {
    lock_dir.join(format!("{}.{}", sanitize(command), RECORD_EXTENSION))
}

/// Path of the record for `command`, rejecting names with no usable
/// characters.
///
/// Such names would all map to a bare `.pid` file that listing never shows.
pub(crate) fn record_path(lock_dir: &Path, command: &str) -> Result<PathBuf> {
    if sanitize(command).is_empty() {
        return Err(CmdLockError::UserError(format!(
            "command name '{}' has no letters, digits, or hyphens to name a lock",
            command
        )));
    }
    Ok(lock_path(lock_dir, command))
}

/// Read a record's raw payload.
///
/// Returns `Ok(None)` when no record exists. Non-UTF-8 bytes are replaced,
/// which later assesses as malformed.
pub(crate) fn read_record(path: &Path) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CmdLockError::StorageError(format!(
            "failed to read lock record '{}': {}",
            path.display(),
            e
        ))),
    }
}

/// Create a record using create_new semantics.
///
/// Returns `Ok(false)` if a record already exists at `path`.
pub(crate) fn create_record(path: &Path, record: &LockRecord) -> Result<bool> {
    // Ensure the lock directory exists
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            CmdLockError::StorageError(format!(
                "failed to create lock directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(CmdLockError::StorageError(format!(
                "failed to create lock record '{}': {}",
                path.display(),
                e
            )));
        }
    };

    file.write_all(record.to_string().as_bytes()).map_err(|e| {
        // Clean up the record on write failure
        let _ = fs::remove_file(path);
        CmdLockError::StorageError(format!(
            "failed to write lock record '{}': {}",
            path.display(),
            e
        ))
    })?;

    file.sync_all().map_err(|e| {
        let _ = fs::remove_file(path);
        CmdLockError::StorageError(format!(
            "failed to sync lock record '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(true)
}

/// Delete a record if it exists.
///
/// Returns whether a record was removed. A record that is already gone is
/// not an error.
pub(crate) fn remove_record(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(CmdLockError::StorageError(format!(
            "failed to remove lock record '{}': {}",
            path.display(),
            e
        ))),
    }
}

/// Delete a record only if it still holds `expected`.
///
/// Returns `Ok(None)` once the record is gone, whether removed here or by
/// someone else. Returns the current payload, untouched, when another
/// process has replaced it since `expected` was read.
pub(crate) fn reclaim_record(path: &Path, expected: &str) -> Result<Option<String>> {
    match read_record(path)? {
        Some(current) if current != expected => Ok(Some(current)),
        Some(_) => {
            remove_record(path)?;
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Read and assess the record at `path`, if any.
pub fn inspect_lock(path: &Path, local_host: &str) -> Result<Option<LockInfo>> {
    let Some(raw) = read_record(path)? else {
        return Ok(None);
    };

    let (record, state) = LockState::assess(&raw, local_host);
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(DateTime::<Utc>::from);
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Some(LockInfo {
        path: path.to_path_buf(),
        name,
        owner: raw.trim().to_string(),
        record,
        state,
        modified,
    }))
}

/// List all lock records in `lock_dir`, sorted by name.
///
/// A missing lock directory yields an empty list.
pub fn list_locks(lock_dir: &Path, local_host: &str) -> Result<Vec<LockInfo>> {
    let mut locks = Vec::new();

    if !lock_dir.exists() {
        return Ok(locks);
    }

    let entries = fs::read_dir(lock_dir).map_err(|e| {
        CmdLockError::StorageError(format!(
            "failed to read lock directory '{}': {}",
            lock_dir.display(),
            e
        ))
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| {
            CmdLockError::StorageError(format!("failed to read lock directory entry: {}", e))
        })?;

        let path = entry.path();

        // Skip non-record files
        if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
            continue;
        }

        // Records removed between listing and reading are skipped
        if let Some(info) = inspect_lock(&path, local_host)? {
            locks.push(info);
        }
    }

    locks.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(locks)
}

/// Clear the lock record for `command`.
///
/// The caller is responsible for verifying that clearing the lock is
/// appropriate (e.g., checking --force).
pub fn clear_lock(lock_dir: &Path, command: &str, local_host: &str) -> Result<LockInfo> {
    let path = record_path(lock_dir, command)?;

    let Some(info) = inspect_lock(&path, local_host)? else {
        return Err(CmdLockError::UserError(format!(
            "lock '{}' does not exist at: {}",
            command,
            path.display()
        )));
    };

    remove_record(&path)?;

    Ok(info)
}
