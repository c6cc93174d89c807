//! Wire messages.
//!
//! One JSON object per line in each direction. Requests are tagged by
//! `method`, responses by `kind`.

use corral_common::error::{CorralError, FailureCategory, Result};
use corral_common::types::{ContainerId, ContainerSummary};
use serde::{Deserialize, Serialize};

/// A lifecycle operation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Request {
    /// Register a container and prepare its bundle.
    Create {
        /// Root filesystem path.
        image: String,
        /// Display label.
        name: String,
        /// Entrypoint shell command.
        command: String,
    },
    /// Launch a container.
    Start {
        /// Target container.
        container_id: ContainerId,
    },
    /// Signal a running container to terminate.
    Stop {
        /// Target container.
        container_id: ContainerId,
    },
    /// Remove a non-running container and its bundle.
    Delete {
        /// Target container.
        container_id: ContainerId,
    },
    /// Run a command inside a running container.
    Exec {
        /// Target container.
        container_id: ContainerId,
        /// Shell command to run.
        command: String,
    },
    /// Snapshot every registered container.
    List,
    /// Read a container's runtime log artifact.
    GetLogs {
        /// Target container.
        container_id: ContainerId,
    },
}

/// The reply to one [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    /// Reply to `create`.
    Created {
        /// Identifier of the new container.
        container_id: ContainerId,
    },
    /// Reply to `start`, `stop`, and `delete`.
    Applied {
        /// Whether the operation applied and succeeded.
        success: bool,
    },
    /// Reply to `exec`.
    Exec {
        /// Combined command output.
        output: String,
        /// Whether the command ran and exited zero.
        success: bool,
    },
    /// Reply to `list`.
    List {
        /// Registered containers.
        containers: Vec<ContainerSummary>,
    },
    /// Reply to `get_logs`.
    Logs {
        /// Log text or sentinel message.
        logs: String,
        /// Whether the log artifact was read.
        success: bool,
    },
    /// A hard failure.
    Error {
        /// Failure classification.
        category: FailureCategory,
        /// Human-readable description.
        message: String,
    },
}

impl Response {
    /// Converts an error into its wire form.
    #[must_use]
    pub fn from_error(err: &CorralError) -> Self {
        Self::Error {
            category: err.category(),
            message: err.to_string(),
        }
    }
}

/// Serializes a message as one newline-terminated line.
///
/// # Errors
///
/// Returns [`CorralError::Serialization`] if encoding fails.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    Ok(line)
}

/// Parses one line into a message.
///
/// # Errors
///
/// Returns [`CorralError::Serialization`] if the line is not a valid message.
pub fn decode<'a, T: Deserialize<'a>>(line: &'a str) -> Result<T> {
    Ok(serde_json::from_str(line.trim_end())?)
}
