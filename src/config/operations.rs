//! Config loading, validation, and utility operations.

use super::model::Config;
use super::types::DEFAULT_CONFIG_PATH;
use crate::error::{CmdLockError, Result};
use std::path::{Path, PathBuf};

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            CmdLockError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Resolve the effective configuration.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_PATH`] is
    /// used when present and built-in defaults otherwise. `lock_dir`
    /// replaces the configured lock directory.
    pub fn resolve(path: Option<&Path>, lock_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).is_file() => Self::load(DEFAULT_CONFIG_PATH)?,
            None => Self::default(),
        };

        if let Some(dir) = lock_dir {
            config.lock_dir = dir;
            config.validate()?;
        }

        Ok(config)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| CmdLockError::UserError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `lock_dir` must be non-empty
    /// - `exclude` entries must be non-empty
    /// - `host_id`, when set, must be non-empty and must not contain `:`
    pub fn validate(&self) -> Result<()> {
        if self.lock_dir.as_os_str().is_empty() {
            return Err(CmdLockError::UserError(
                "config validation failed: lock_dir must not be empty".to_string(),
            ));
        }

        if self.exclude.iter().any(|name| name.trim().is_empty()) {
            return Err(CmdLockError::UserError(
                "config validation failed: exclude entries must be non-empty".to_string(),
            ));
        }

        if let Some(host) = &self.host_id {
            if host.trim().is_empty() {
                return Err(CmdLockError::UserError(
                    "config validation failed: host_id must not be empty".to_string(),
                ));
            }
            if host.contains(':') {
                return Err(CmdLockError::UserError(format!(
                    "config validation failed: host_id must not contain ':' (found '{}')",
                    host
                )));
            }
        }

        Ok(())
    }
}
