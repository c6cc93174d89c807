//! Unified error types for the Corral workspace.
//!
//! A lifecycle operation that does not apply (unknown container, wrong
//! state) or whose runtime invocation exits non-zero is *not* an error; those
//! outcomes are reported as `false` results by the lifecycle service. The
//! variants below are the hard failures that reach the caller.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CorralError {
    /// An I/O operation on a bundle, log artifact, or socket failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid value.
        message: String,
    },

    /// A request argument is invalid.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// The external runtime binary could not be launched or waited on.
    #[error("container runtime `{binary}` could not be invoked: {source}")]
    RuntimeUnavailable {
        /// Binary that was being invoked.
        binary: String,
        /// Underlying spawn or wait error.
        source: std::io::Error,
    },

    /// An external runtime invocation exceeded the configured timeout.
    #[error("runtime `{verb}` for {id} timed out after {seconds}s")]
    RuntimeTimeout {
        /// Runtime verb (`run`, `kill`, `exec`, `delete`).
        verb: &'static str,
        /// Target container identifier.
        id: String,
        /// Timeout that elapsed.
        seconds: u64,
    },

    /// The registry lock was poisoned by a panicking holder.
    #[error("container registry lock poisoned")]
    LockPoisoned,

    /// The daemon reported an error for a request.
    #[error("{category} error reported by daemon: {message}")]
    Remote {
        /// Failure category reported by the daemon.
        category: FailureCategory,
        /// Server-side error message.
        message: String,
    },

    /// The transport produced an unexpected or missing response.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the protocol violation.
        message: String,
    },
}

impl CorralError {
    /// Classifies the error so callers can tell user-actionable failures
    /// from operator-actionable ones.
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::Io { .. } => FailureCategory::Io,
            Self::Config { .. } | Self::InvalidArgument { .. } | Self::Serialization { .. } => {
                FailureCategory::InvalidRequest
            }
            Self::RuntimeUnavailable { .. } | Self::RuntimeTimeout { .. } => {
                FailureCategory::Infrastructure
            }
            Self::LockPoisoned | Self::Transport { .. } => FailureCategory::Internal,
            Self::Remote { category, .. } => *category,
        }
    }

    /// Builds an [`CorralError::Io`] for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Coarse failure classification carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Bundle or log file creation, read, or removal failed.
    Io,
    /// The external runtime could not be reached or hung.
    Infrastructure,
    /// The request itself was malformed or carried invalid values.
    InvalidRequest,
    /// An internal invariant failed inside the daemon.
    Internal,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Io => "io",
            Self::Infrastructure => "infrastructure",
            Self::InvalidRequest => "invalid request",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CorralError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_failures_are_infrastructure() {
        let err = CorralError::RuntimeUnavailable {
            binary: "runc".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.category(), FailureCategory::Infrastructure);

        let timeout = CorralError::RuntimeTimeout {
            verb: "kill",
            id: "ctr-1".into(),
            seconds: 5,
        };
        assert_eq!(timeout.category(), FailureCategory::Infrastructure);
        assert!(timeout.to_string().contains("timed out after 5s"));
    }

    #[test]
    fn remote_errors_keep_their_category() {
        let err = CorralError::Remote {
            category: FailureCategory::Io,
            message: "disk full".into(),
        };
        assert_eq!(err.category(), FailureCategory::Io);
    }

    #[test]
    fn invalid_argument_is_invalid_request() {
        let err = CorralError::InvalidArgument {
            message: "name must not be empty".into(),
        };
        assert_eq!(err.category(), FailureCategory::InvalidRequest);
        assert_eq!(err.to_string(), "invalid argument: name must not be empty");
    }

    #[test]
    fn category_wire_names_are_snake_case() {
        let json = serde_json::to_string(&FailureCategory::InvalidRequest).unwrap();
        assert_eq!(json, "\"invalid_request\"");
    }
}
