//! Exit code constants for the cmdlock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config, missing lock record)
//! - 2: Lock storage failure (read/write/delete of a lock record)
//! - 3: The protected command could not be started
//! - 4: Another instance of the command holds the lock
//!
//! `cmdlock run` otherwise mirrors the exit code of the wrapped command.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or missing lock record.
pub const USER_ERROR: i32 = 1;

/// Lock storage failure: a lock record could not be read, written or removed.
pub const STORAGE_FAILURE: i32 = 2;

/// The wrapped command could not be spawned.
pub const SPAWN_FAILURE: i32 = 3;

/// The lock is held by another running instance.
pub const LOCK_CONFLICT: i32 = 4;

/// Offset added to a signal number when a command dies from that signal.
pub const SIGNAL_BASE: i32 = 128;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            STORAGE_FAILURE,
            SPAWN_FAILURE,
            LOCK_CONFLICT,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn exit_codes_stay_below_signal_range() {
        for code in [USER_ERROR, STORAGE_FAILURE, SPAWN_FAILURE, LOCK_CONFLICT] {
            assert!(code < SIGNAL_BASE);
        }
    }
}
