//! Locking subsystem for cmdlock.
//!
//! Prevents two instances of the same named command from running at once
//! across every host that shares the lock directory.
//!
//! # Lock Records
//!
//! One record per command, `<sanitized-name>.pid`, inside the configured
//! lock directory. Records are created with **create_new** semantics
//! (exclusive create), so two claimers racing on a free lock cannot both win.
//!
//! The record payload is `host:pid`:
//! - A record from another host is always honored; its process cannot be
//!   checked from here.
//! - A record from this host whose process group no longer exists is stale
//!   and is reclaimed by the next `acquire`.
//! - A payload that does not parse is treated like a stale record.
//!
//! # Release
//!
//! `LockManager::release` removes the record when the command finishes.
//! Every claimed record is also registered with [`crate::shutdown`], which
//! removes it when the process exits without releasing.

mod liveness;
mod manager;
mod operations;
mod record;
mod sanitize;
mod types;


// Re-export public API
pub use manager::{Acquisition, LockManager};
pub(crate) use operations::remove_record;
pub use operations::{RECORD_EXTENSION, clear_lock, inspect_lock, list_locks, lock_path};
pub use record::LockRecord;
pub use sanitize::sanitize;
pub use types::{CommandOutcome, LockInfo, LockState};
