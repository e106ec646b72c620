//! Error types for the cmdlock CLI.
//!
//! Uses thiserror for derive macros and provides operator-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for cmdlock operations.
///
/// Each variant maps to a specific exit code.
#[derive(Error, Debug)]
pub enum CmdLockError {
    /// User provided invalid arguments or configuration.
    #[error("{0}")]
    UserError(String),

    /// Another live instance (or a foreign host) holds the lock.
    ///
    /// `owner` is the raw `host:pid` descriptor read from the lock record.
    #[error("command '{command}' is already running (owner: {owner})")]
    AlreadyRunning { command: String, owner: String },

    /// Reading, writing or deleting a lock record failed.
    #[error("Lock storage failure: {0}")]
    StorageError(String),

    /// The protected command could not be started.
    #[error("Failed to start command: {0}")]
    SpawnError(String),
}

impl CmdLockError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CmdLockError::UserError(_) => exit_codes::USER_ERROR,
            CmdLockError::AlreadyRunning { .. } => exit_codes::LOCK_CONFLICT,
            CmdLockError::StorageError(_) => exit_codes::STORAGE_FAILURE,
            CmdLockError::SpawnError(_) => exit_codes::SPAWN_FAILURE,
        }
    }
}

/// Result type alias for cmdlock operations.
pub type Result<T> = std::result::Result<T, CmdLockError>;
