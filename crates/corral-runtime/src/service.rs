//! Lifecycle operations exposed to the transport.
//!
//! Every operation takes the registry lock first and holds it across
//! validation, the external side effect, and the registry mutation, so no
//! two operations ever interleave, even on different containers. A hung
//! runtime therefore stalls every other operation; configure
//! `invoke_timeout_secs` to bound that.
//!
//! Operations that do not apply (unknown id, wrong state) and runtime
//! invocations that exit non-zero return `false` and leave the registry
//! unchanged. Only I/O failures on `create`/`delete` and failures to reach
//! the runtime at all are returned as errors.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use corral_common::config::CorralConfig;
use corral_common::constants::NO_LOGS_SENTINEL;
use corral_common::error::{CorralError, Result};
use corral_common::types::{ContainerId, ContainerState, ContainerSummary};

use crate::bundle::{BundleBuilder, UserSpec};
use crate::container::{ContainerRecord, Operation};
use crate::invoker::{RuncInvoker, RuntimeInvoker, Signal};
use crate::logs;
use crate::registry::Registry;

/// Outcome of [`LifecycleService::exec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecReply {
    /// Combined stdout and stderr of the command.
    pub output: String,
    /// Whether the container was running and the command exited zero.
    pub success: bool,
}

/// Outcome of [`LifecycleService::get_logs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsReply {
    /// Log artifact contents, or a sentinel message when unavailable.
    pub logs: String,
    /// Whether the log artifact was read.
    pub success: bool,
}

/// The container lifecycle manager.
pub struct LifecycleService {
    registry: Mutex<Registry>,
    bundles: BundleBuilder,
    invoker: Box<dyn RuntimeInvoker>,
    stop_signal: Signal,
}

impl LifecycleService {
    /// Creates a service that drives the configured OCI runtime binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &CorralConfig) -> Result<Self> {
        let invoker =
            RuncInvoker::new(config.runtime_binary.clone()).with_timeout(config.invoke_timeout());
        if !invoker.is_available() {
            tracing::warn!(binary = invoker.binary(), "container runtime not found in PATH");
        }
        Self::with_invoker(config, Box::new(invoker))
    }

    /// Creates a service with a caller-supplied runtime invoker.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or names an
    /// unknown stop signal.
    pub fn with_invoker(config: &CorralConfig, invoker: Box<dyn RuntimeInvoker>) -> Result<Self> {
        config.validate()?;
        let stop_signal: Signal = config.stop_signal.parse().map_err(|_| CorralError::Config {
            message: format!("unknown stop signal: {}", config.stop_signal),
        })?;
        let user = UserSpec {
            uid: config.user_uid,
            gid: config.user_gid,
        };
        Ok(Self {
            registry: Mutex::new(Registry::new()),
            bundles: BundleBuilder::new(config.scratch_root.clone(), user),
            invoker,
            stop_signal,
        })
    }

    /// Bundle directory a container uses (or would use).
    #[must_use]
    pub fn bundle_dir(&self, id: &ContainerId) -> PathBuf {
        self.bundles.bundle_dir(id)
    }

    /// Registers a new container and materializes its bundle.
    ///
    /// The record is inserted only after the bundle is fully written.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::InvalidArgument`] for an empty argument and
    /// [`CorralError::Io`] if the bundle cannot be written.
    pub fn create(&self, image: &str, name: &str, command: &str) -> Result<ContainerId> {
        require("image", image)?;
        require("name", name)?;
        require("command", command)?;

        let mut registry = self.lock()?;
        let id = registry.allocate_id();
        let record = ContainerRecord::new(id.clone(), name.into(), image.into(), command.into());

        if let Err(err) = self.bundles.prepare(&record) {
            tracing::error!(id = %id, error = %err, "failed to prepare bundle");
            return Err(err);
        }
        let inserted = registry.insert(record);
        debug_assert!(inserted, "allocated id must be free");

        tracing::info!(id = %id, name, image, "container created");
        Ok(id)
    }

    /// Launches a `created` or `stopped` container.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be invoked.
    pub fn start(&self, id: &ContainerId) -> Result<bool> {
        let mut registry = self.lock()?;
        let Some(from) = applicable(&registry, id, Operation::Start) else {
            return Ok(false);
        };

        if from == ContainerState::Stopped {
            self.clear_runtime_state(id)?;
        }

        let bundle = self.bundles.bundle_dir(id);
        let invocation = self.invoker.run(id, &bundle, &logs::log_path(&bundle))?;
        if !invocation.success() {
            tracing::warn!(id = %id, exit_code = ?invocation.exit_code, stderr = %invocation.stderr.trim(), "runtime failed to start container");
            return Ok(false);
        }

        let started = commit(&mut registry, id, Operation::Start);
        tracing::info!(id = %id, "container started");
        Ok(started)
    }

    /// Signals a `running` container to terminate.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be invoked.
    pub fn stop(&self, id: &ContainerId) -> Result<bool> {
        let mut registry = self.lock()?;
        if applicable(&registry, id, Operation::Stop).is_none() {
            return Ok(false);
        }

        let invocation = self.invoker.kill(id, self.stop_signal)?;
        if !invocation.success() {
            tracing::warn!(id = %id, exit_code = ?invocation.exit_code, stderr = %invocation.stderr.trim(), "runtime failed to stop container");
            return Ok(false);
        }

        let stopped = commit(&mut registry, id, Operation::Stop);
        tracing::info!(id = %id, signal = self.stop_signal.as_str(), "container stopped");
        Ok(stopped)
    }

    /// Removes a `created` or `stopped` container and its bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be invoked or the bundle
    /// directory cannot be removed; the record stays registered in both
    /// cases.
    pub fn delete(&self, id: &ContainerId) -> Result<bool> {
        let mut registry = self.lock()?;
        let Some(from) = applicable(&registry, id, Operation::Delete) else {
            return Ok(false);
        };

        if from == ContainerState::Stopped {
            self.clear_runtime_state(id)?;
        }

        if let Err(err) = self.bundles.remove(id) {
            tracing::error!(id = %id, error = %err, "failed to remove bundle");
            return Err(err);
        }
        let _ = registry.remove(id);

        tracing::info!(id = %id, "container deleted");
        Ok(true)
    }

    /// Runs `command` inside a `running` container.
    ///
    /// A container that is not running yields `success == false` without
    /// invoking the runtime. A command that exits non-zero yields
    /// `success == false` together with its output.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::InvalidArgument`] for an empty command sent to
    /// a running container, or an error if the runtime cannot be invoked.
    pub fn exec(&self, id: &ContainerId, command: &str) -> Result<ExecReply> {
        let registry = self.lock()?;
        if applicable(&registry, id, Operation::Exec).is_none() {
            return Ok(ExecReply {
                output: String::new(),
                success: false,
            });
        }
        require("command", command)?;

        let invocation = self.invoker.exec(id, command)?;
        if !invocation.success() {
            tracing::warn!(id = %id, exit_code = ?invocation.exit_code, "exec command failed");
        }
        drop(registry);

        Ok(ExecReply {
            output: invocation.combined(),
            success: invocation.success(),
        })
    }

    /// Snapshot of every registered container.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::LockPoisoned`] if the registry is unusable.
    pub fn list(&self) -> Result<Vec<ContainerSummary>> {
        let containers = self.lock()?.snapshot();
        tracing::debug!(count = containers.len(), "listed containers");
        Ok(containers)
    }

    /// Reads the runtime log artifact of a container.
    ///
    /// An unknown container or a missing/unreadable artifact yields the
    /// sentinel text with `success == false`.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::LockPoisoned`] if the registry is unusable.
    pub fn get_logs(&self, id: &ContainerId) -> Result<LogsReply> {
        let registry = self.lock()?;
        if registry.get(id).is_none() {
            tracing::debug!(id = %id, "logs requested for unknown container");
            return Ok(LogsReply::unavailable());
        }

        let reply = match logs::read_logs(&self.bundles.bundle_dir(id)) {
            Ok(logs) => LogsReply {
                logs,
                success: true,
            },
            Err(err) => {
                tracing::debug!(id = %id, error = %err, "log artifact unavailable");
                LogsReply::unavailable()
            }
        };
        drop(registry);
        Ok(reply)
    }

    /// Drops the runtime's record of a stopped container. A non-zero exit
    /// is tolerated; the runtime may never have known the container.
    fn clear_runtime_state(&self, id: &ContainerId) -> Result<()> {
        let invocation = self.invoker.remove(id)?;
        if !invocation.success() {
            tracing::debug!(id = %id, exit_code = ?invocation.exit_code, "runtime delete reported failure");
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Registry>> {
        self.registry.lock().map_err(|_| CorralError::LockPoisoned)
    }
}

impl LogsReply {
    fn unavailable() -> Self {
        Self {
            logs: NO_LOGS_SENTINEL.to_string(),
            success: false,
        }
    }
}

/// Returns the record's current state if `op` applies to it.
fn applicable(registry: &Registry, id: &ContainerId, op: Operation) -> Option<ContainerState> {
    match registry.get(id) {
        None => {
            tracing::debug!(id = %id, op = op.as_str(), "container not found");
            None
        }
        Some(record) if !record.permits(op) => {
            tracing::debug!(id = %id, op = op.as_str(), state = %record.state(), "operation not applicable");
            None
        }
        Some(record) => Some(record.state()),
    }
}

fn commit(registry: &mut Registry, id: &ContainerId, op: Operation) -> bool {
    registry
        .get_mut(id)
        .is_some_and(|record| record.transition(op))
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CorralError::InvalidArgument {
            message: format!("{field} must not be empty"),
        });
    }
    Ok(())
}
