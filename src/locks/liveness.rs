//! Local process liveness check.

use nix::errno::Errno;
use nix::unistd::{Pid, getpgid};

/// Whether a process group lookup for `pid` succeeds on this host.
///
/// Only meaningful for pids recorded by this host. Errors other than
/// `ESRCH` mean the process exists but is not inspectable, so they count
/// as alive.
pub fn process_group_exists(pid: u32) -> bool {
    let raw = match i32::try_from(pid) {
        Ok(raw) if raw > 0 => raw,
        _ => return false,
    };

    match getpgid(Some(Pid::from_raw(raw))) {
        Ok(_) => true,
        Err(Errno::ESRCH) => false,
        Err(_) => true,
    }
}
