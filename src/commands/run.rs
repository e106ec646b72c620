//! `cmdlock run`: hold a command's lock while a child process runs.

use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::{CmdLockError, Result};
use crate::locks::{Acquisition, CommandOutcome, LockManager};
use crate::shutdown;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::process::{Child, Command};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often the child and the shutdown flag are polled.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Run the command in `args` under its lock.
///
/// Returns the exit code to report: the child's exit code, or
/// `128 + signal` if it died from a signal.
pub fn cmd_run(config: &Config, args: RunArgs) -> Result<i32> {
    shutdown::install_signal_handlers()?;

    let mut manager = LockManager::new(config)?;
    run_locked(&mut manager, &args.name, &args.command)
}

/// Acquire `name`, run `command`, and release on every path out.
pub(crate) fn run_locked(
    manager: &mut LockManager,
    name: &str,
    command: &[String],
) -> Result<i32> {
    match manager.acquire(name)? {
        Acquisition::Excluded => debug!(command = name, "running without a lock"),
        Acquisition::Locked { path, reclaimed } => debug!(
            command = name,
            path = %path.display(),
            reclaimed = ?reclaimed,
            "holding lock while command runs"
        ),
    }

    let result = supervise(command);
    let outcome = match &result {
        Ok(outcome) => *outcome,
        Err(_) => CommandOutcome::NotStarted,
    };

    manager.release(name, &outcome)?;

    Ok(result?.exit_code())
}

/// Spawn `command` and wait for it, forwarding termination signals.
fn supervise(command: &[String]) -> Result<CommandOutcome> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| CmdLockError::UserError("no command to run".to_string()))?;

    // Asked to stop before the child even started
    if let Some(sig) = shutdown::requested_signal() {
        info!(signal = ?sig, "termination requested before start, not running command");
        return Ok(CommandOutcome::Signaled(sig as i32));
    }

    let mut child = Command::new(program)
        .args(args)
        .spawn()
        .map_err(|e| CmdLockError::SpawnError(format!("'{}': {}", program, e)))?;

    debug!(pid = child.id(), program = program.as_str(), "command started");
    wait_for_child(&mut child)
}

/// Wait for the child to finish.
///
/// Once a termination signal has been forwarded, the outcome is that signal
/// regardless of how the child chose to exit.
fn wait_for_child(child: &mut Child) -> Result<CommandOutcome> {
    let mut forwarded: Option<Signal> = None;

    loop {
        let status = child.try_wait().map_err(|e| {
            CmdLockError::SpawnError(format!("failed to wait for pid {}: {}", child.id(), e))
        })?;
        if let Some(status) = status {
            let child_outcome = CommandOutcome::from_status(status);
            return Ok(match forwarded {
                Some(sig) => {
                    debug!(signal = ?sig, child = %child_outcome, "command stopped after signal");
                    CommandOutcome::Signaled(sig as i32)
                }
                None => child_outcome,
            });
        }

        if forwarded.is_none()
            && let Some(sig) = shutdown::requested_signal()
        {
            forward_signal(child, sig);
            forwarded = Some(sig);
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Pass a termination signal on to the child, killing it if that fails.
fn forward_signal(child: &mut Child, sig: Signal) {
    info!(signal = ?sig, pid = child.id(), "forwarding signal to command");

    let Ok(raw) = i32::try_from(child.id()) else {
        return;
    };
    if let Err(e) = signal::kill(Pid::from_raw(raw), sig) {
        warn!("failed to forward {:?} to pid {}: {}", sig, raw, e);
        let _ = child.kill();
    }
}
