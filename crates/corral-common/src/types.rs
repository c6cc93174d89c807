//! Domain primitive types used across the Corral workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::CONTAINER_ID_PREFIX;

/// Unique identifier for a container instance.
///
/// Also used verbatim as the container name handed to the external runtime
/// and as the bundle directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random container ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{CONTAINER_ID_PREFIX}{}", uuid::Uuid::new_v4().simple()))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    /// Bundle prepared; the container has never been started.
    Created,
    /// The external runtime reported a successful launch.
    Running,
    /// The container was signalled to terminate.
    Stopped,
}

impl ContainerState {
    /// Returns the lowercase wire name of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of one registry record, as returned by `list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSummary {
    /// Unique identifier.
    pub id: ContainerId,
    /// Display label supplied at creation.
    pub name: String,
    /// Root filesystem path used as the bundle root.
    pub image: String,
    /// Current lifecycle state.
    pub status: ContainerState,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}
