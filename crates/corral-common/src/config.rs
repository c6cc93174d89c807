//! Global configuration model for the Corral daemon.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{CorralError, Result};

/// Root configuration for the Corral daemon.
///
/// Every field has a default, so a configuration file only needs to name
/// the values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorralConfig {
    /// Parent directory of every container bundle.
    pub scratch_root: PathBuf,
    /// Unix socket the daemon listens on.
    pub socket_path: PathBuf,
    /// External OCI runtime binary name or path.
    pub runtime_binary: String,
    /// Signal name delivered by `stop`.
    pub stop_signal: String,
    /// Upper bound on a single runtime invocation, in seconds.
    pub invoke_timeout_secs: Option<u64>,
    /// User id of the container entrypoint process.
    pub user_uid: u32,
    /// Group id of the container entrypoint process.
    pub user_gid: u32,
}

impl Default for CorralConfig {
    fn default() -> Self {
        Self {
            scratch_root: PathBuf::from(constants::DEFAULT_SCRATCH_ROOT),
            socket_path: PathBuf::from(constants::DEFAULT_SOCKET_PATH),
            runtime_binary: constants::DEFAULT_RUNTIME_BINARY.to_string(),
            stop_signal: constants::DEFAULT_STOP_SIGNAL.to_string(),
            invoke_timeout_secs: None,
            user_uid: constants::DEFAULT_UNPRIVILEGED_ID,
            user_gid: constants::DEFAULT_UNPRIVILEGED_ID,
        }
    }
}

impl CorralConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`validate`](Self::validate).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| CorralError::io(path, e))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values that cannot be expressed in the type system.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.scratch_root.as_os_str().is_empty() {
            return Err(invalid("scratch_root must not be empty"));
        }
        if self.socket_path.as_os_str().is_empty() {
            return Err(invalid("socket_path must not be empty"));
        }
        if self.runtime_binary.trim().is_empty() {
            return Err(invalid("runtime_binary must not be empty"));
        }
        if self.invoke_timeout_secs == Some(0) {
            return Err(invalid("invoke_timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Returns the invocation timeout as a [`Duration`], if configured.
    #[must_use]
    pub fn invoke_timeout(&self) -> Option<Duration> {
        self.invoke_timeout_secs.map(Duration::from_secs)
    }
}

fn invalid(message: &str) -> CorralError {
    CorralError::Config {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = CorralConfig::default();
        config.validate().unwrap();
        assert_eq!(config.runtime_binary, "runc");
        assert_eq!(config.user_uid, 65534);
        assert!(config.invoke_timeout().is_none());
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corral.json");
        std::fs::write(&path, r#"{"runtime_binary": "crun", "invoke_timeout_secs": 30}"#).unwrap();

        let config = CorralConfig::load(&path).unwrap();
        assert_eq!(config.runtime_binary, "crun");
        assert_eq!(config.invoke_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.scratch_root, PathBuf::from(constants::DEFAULT_SCRATCH_ROOT));
    }

    #[test]
    fn load_rejects_zero_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corral.json");
        std::fs::write(&path, r#"{"invoke_timeout_secs": 0}"#).unwrap();

        let err = CorralConfig::load(&path).unwrap_err();
        assert!(matches!(err, CorralError::Config { .. }));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CorralConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CorralError::Io { .. }));
    }
}
