//! Config struct definition and default implementation.

use super::types::*;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Configuration for cmdlock.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one `<name>.pid` record per running command.
    ///
    /// Every participating host must see the same directory.
    #[serde(default = "default_lock_dir")]
    pub lock_dir: PathBuf,

    /// Command names that bypass locking entirely.
    #[serde(default)]
    pub exclude: BTreeSet<String>,

    /// Overrides the OS host name written into lock records.
    #[serde(default)]
    pub host_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lock_dir: default_lock_dir(),
            exclude: BTreeSet::new(),
            host_id: None,
        }
    }
}
