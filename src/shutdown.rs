//! Termination-time cleanup of held lock records.
//!
//! Records registered here are removed when the process ends, as long as the
//! runtime still gets control:
//! - Normal return from `main`, `std::process::exit`, and an unwinding panic
//!   on the main thread all reach the C `atexit` hook.
//! - SIGINT, SIGTERM and SIGHUP are only recorded by the handler. The
//!   supervising loop polls [`requested_signal`] and shuts down through the
//!   normal path.
//!
//! SIGKILL cannot be intercepted. The record it leaves behind is reclaimed as
//! stale by the next acquisition on the same host.

use crate::error::{CmdLockError, Result};
use crate::locks::remove_record;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, MutexGuard, Once};
use tracing::{debug, warn};

/// Record paths to remove at exit.
static PENDING: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

static EXIT_HOOK: Once = Once::new();

/// Last termination signal received (0 if none).
static SIGNAL_RECEIVED: AtomicI32 = AtomicI32::new(0);

/// Signals that trigger an orderly shutdown.
const SHUTDOWN_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP];

fn pending() -> MutexGuard<'static, Vec<PathBuf>> {
    PENDING.lock().unwrap_or_else(|poison| poison.into_inner())
}

/// Schedule `path` for removal at process exit.
///
/// Registering the same path again is a no-op. The exit hook is installed
/// on first use.
pub fn register(path: &Path) {
    EXIT_HOOK.call_once(install_exit_hook);

    let mut pending = pending();
    if !pending.iter().any(|p| p == path) {
        pending.push(path.to_path_buf());
    }
}

/// Cancel the exit-time removal of `path`.
///
/// Called once the record has been released explicitly, so the hook never
/// deletes a record that a later owner created.
pub fn deregister(path: &Path) -> bool {
    let mut pending = pending();
    let before = pending.len();
    pending.retain(|p| p != path);
    pending.len() != before
}

/// Whether `path` is scheduled for removal at exit.
#[cfg(test)]
pub fn is_registered(path: &Path) -> bool {
    pending().iter().any(|p| p == path)
}

/// Remove every scheduled record now and clear the schedule.
///
/// Failures are logged: at exit there is no caller left to report them to.
pub fn run_pending() -> usize {
    let paths = std::mem::take(&mut *pending());
    let mut removed = 0;

    for path in paths {
        match remove_record(&path) {
            Ok(true) => {
                debug!(path = %path.display(), "removed lock record at shutdown");
                removed += 1;
            }
            Ok(false) => {}
            Err(e) => warn!("{}", e),
        }
    }

    removed
}

fn install_exit_hook() {
    // SAFETY: `run_at_exit` takes no arguments and never unwinds.
    let rc = unsafe { libc::atexit(run_at_exit) };
    if rc != 0 {
        warn!("failed to register exit hook; held locks will not be removed at exit");
    }
}

extern "C" fn run_at_exit() {
    let _ = std::panic::catch_unwind(run_pending);
}

/// Install handlers for SIGINT, SIGTERM and SIGHUP.
///
/// The handler only stores the signal number. Call this before spawning
/// any threads.
pub fn install_signal_handlers() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(record_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );

    for sig in SHUTDOWN_SIGNALS {
        // SAFETY: `record_signal` is async-signal-safe (one atomic store).
        let installed = unsafe { signal::sigaction(sig, &action) };
        installed.map_err(|e| {
            CmdLockError::UserError(format!("failed to install {:?} handler: {}", sig, e))
        })?;
    }

    debug!("signal handlers installed (SIGINT, SIGTERM, SIGHUP)");
    Ok(())
}

extern "C" fn record_signal(signal: libc::c_int) {
    SIGNAL_RECEIVED.store(signal, Ordering::SeqCst);
}

/// The termination signal received so far, if any.
pub fn requested_signal() -> Option<Signal> {
    match SIGNAL_RECEIVED.load(Ordering::SeqCst) {
        0 => None,
        raw => Signal::try_from(raw).ok(),
    }
}

#[cfg(test)]
pub(crate) fn reset_signal() {
    SIGNAL_RECEIVED.store(0, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn run_pending_removes_registered_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("job-a.pid");
        std::fs::write(&path, "host:1").unwrap();

        register(&path);
        register(&path);
        assert!(is_registered(&path));

        assert_eq!(run_pending(), 1);
        assert!(!path.exists());
        assert!(!is_registered(&path));

        // Nothing left to do on a second run
        assert_eq!(run_pending(), 0);
    }

    #[test]
    #[serial]
    fn deregistered_record_survives_shutdown() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("job-b.pid");
        std::fs::write(&path, "other-host:1").unwrap();

        register(&path);
        assert!(deregister(&path));
        assert!(!deregister(&path));

        run_pending();
        assert!(path.exists());
    }

    #[test]
    #[serial]
    fn already_removed_record_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("job-c.pid");

        register(&path);
        assert_eq!(run_pending(), 0);
    }

    #[test]
    #[serial]
    fn handler_records_signal() {
        reset_signal();
        assert_eq!(requested_signal(), None);

        record_signal(libc::SIGTERM);
        assert_eq!(requested_signal(), Some(Signal::SIGTERM));

        reset_signal();
    }
}
