//! Configuration constants and defaults for cmdlock.

use std::path::PathBuf;

/// Config file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/cmdlock.yaml";

// Default value functions for serde
pub(crate) fn default_lock_dir() -> PathBuf {
    std::env::temp_dir().join("cmdlock")
}
