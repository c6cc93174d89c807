//! Container log artifact access.
//!
//! The external runtime writes its log to a fixed file inside the bundle
//! directory; this module only locates and reads it.

use std::path::{Path, PathBuf};

use corral_common::constants::BUNDLE_LOG_FILE;
use corral_common::error::{CorralError, Result};

/// Returns the log artifact path inside a bundle directory.
#[must_use]
pub fn log_path(bundle_dir: &Path) -> PathBuf {
    bundle_dir.join(BUNDLE_LOG_FILE)
}

/// Reads the log artifact of a bundle.
///
/// # Errors
///
/// Returns [`CorralError::Io`] if the artifact is missing or unreadable.
pub fn read_logs(bundle_dir: &Path) -> Result<String> {
    let path = log_path(bundle_dir);
    std::fs::read_to_string(&path).map_err(|e| CorralError::Io { path, source: e })
}
