use crate::config::Config;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Host name used by test managers.
pub(crate) const TEST_HOST: &str = "test-host";

/// A pid that belonged to a process on this host which has exited and been reaped.
pub(crate) fn dead_pid() -> u32 {
    let mut child = Command::new("true")
        .spawn()
        .unwrap_or_else(|e| panic!("failed to spawn `true`: {}", e));
    let pid = child.id();
    child.wait().unwrap();
    pid
}

/// Config pointing at a fresh temporary lock directory.
pub(crate) fn test_config() -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        lock_dir: temp_dir.path().join("locks"),
        host_id: Some(TEST_HOST.to_string()),
        ..Config::default()
    };
    (temp_dir, config)
}

/// Write a raw lock record, creating the lock directory if needed.
pub(crate) fn write_raw_record(path: &Path, payload: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, payload).unwrap();
}
