//! Execution bundle generation.
//!
//! A bundle is one directory per container under the scratch root holding
//! the OCI runtime configuration (`config.json`) and, once started, the
//! runtime's log artifact.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use corral_common::constants::{BUNDLE_CONFIG_FILE, CONTAINER_PATH_ENV, OCI_VERSION};
use corral_common::error::{CorralError, Result};
use corral_common::types::ContainerId;
use serde::{Deserialize, Serialize};

use crate::container::ContainerRecord;

/// OCI runtime configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeSpec {
    /// Runtime specification version.
    pub oci_version: String,
    /// Entrypoint process.
    pub process: ProcessSpec,
    /// Root filesystem.
    pub root: RootSpec,
    /// Container hostname.
    pub hostname: String,
    /// Additional mounts; always empty for generated bundles.
    pub mounts: Vec<MountSpec>,
}

/// Entrypoint process of a [`RuntimeSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// Whether a pseudo-terminal is attached.
    pub terminal: bool,
    /// Identity the process runs as.
    pub user: UserSpec,
    /// Argument vector.
    pub args: Vec<String>,
    /// `KEY=value` environment entries.
    pub env: Vec<String>,
    /// Working directory inside the container.
    pub cwd: String,
}

/// Process identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    /// User id.
    pub uid: u32,
    /// Group id.
    pub gid: u32,
}

/// Root filesystem of a [`RuntimeSpec`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootSpec {
    /// Path to the root filesystem.
    pub path: String,
    /// Whether the root filesystem is mounted read-only.
    pub readonly: bool,
}

/// A single mount entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountSpec {
    /// Mount point inside the container.
    pub destination: String,
    /// Filesystem type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Source path or device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Mount options.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl RuntimeSpec {
    /// Builds the configuration for a container record.
    #[must_use]
    pub fn for_record(record: &ContainerRecord, user: UserSpec) -> Self {
        Self {
            oci_version: OCI_VERSION.to_string(),
            process: ProcessSpec {
                terminal: false,
                user,
                args: vec!["sh".into(), "-c".into(), record.command().to_string()],
                env: vec![CONTAINER_PATH_ENV.to_string()],
                cwd: "/".into(),
            },
            root: RootSpec {
                path: record.image().to_string(),
                readonly: false,
            },
            hostname: record.name().to_string(),
            mounts: Vec::new(),
        }
    }
}

/// Materializes and removes bundle directories under a scratch root.
#[derive(Debug, Clone)]
pub struct BundleBuilder {
    root: PathBuf,
    user: UserSpec,
}

impl BundleBuilder {
    /// Creates a builder rooted at `root`. Nothing is written until
    /// [`prepare`](Self::prepare).
    #[must_use]
    pub const fn new(root: PathBuf, user: UserSpec) -> Self {
        Self { root, user }
    }

    /// Scratch root holding every bundle.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bundle directory for a container.
    #[must_use]
    pub fn bundle_dir(&self, id: &ContainerId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Writes the bundle for `record` and returns its directory.
    ///
    /// The bundle directory must not exist yet. On any failure after the
    /// directory was created it is removed again, so a failed prepare
    /// leaves nothing behind.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Io`] if a directory or the configuration file
    /// cannot be created or written, including when the bundle directory
    /// already exists.
    pub fn prepare(&self, record: &ContainerRecord) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root).map_err(|e| CorralError::io(&self.root, e))?;

        let dir = self.bundle_dir(record.id());
        std::fs::create_dir(&dir).map_err(|e| CorralError::io(&dir, e))?;

        let spec = RuntimeSpec::for_record(record, self.user);
        if let Err(err) = write_spec(&dir.join(BUNDLE_CONFIG_FILE), &spec) {
            if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                tracing::warn!(dir = %dir.display(), error = %cleanup, "failed to clean up partial bundle");
            }
            return Err(err);
        }

        tracing::debug!(id = %record.id(), dir = %dir.display(), "bundle prepared");
        Ok(dir)
    }

    /// Removes a container's bundle directory and everything in it.
    ///
    /// A bundle that is already gone counts as removed.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Io`] if the directory exists but cannot be
    /// removed.
    pub fn remove(&self, id: &ContainerId) -> Result<()> {
        let dir = self.bundle_dir(id);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(id = %id, "bundle already absent");
                Ok(())
            }
            Err(e) => Err(CorralError::io(dir, e)),
        }
    }
}

fn write_spec(path: &Path, spec: &RuntimeSpec) -> Result<()> {
    let file = File::create(path).map_err(|e| CorralError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, spec)?;
    writer.flush().map_err(|e| CorralError::io(path, e))
}
