//! External container runtime invocation.
//!
//! [`RuntimeInvoker`] is the seam between the lifecycle state machine and
//! the containment technology. An `Err` from any verb means the runtime
//! could not be invoked at all; an `Ok` [`Invocation`] with a non-zero exit
//! means it ran and reported a container-level failure.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use corral_common::error::{CorralError, Result};
use corral_common::types::ContainerId;

pub use nix::sys::signal::Signal;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Result of a runtime invocation that was launched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// Exit code, `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl Invocation {
    /// Creates an invocation result.
    pub fn new(exit_code: Option<i32>, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// A zero-exit invocation with the given standard output.
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self::new(Some(0), stdout, "")
    }

    /// Returns whether the runtime exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    /// Standard output followed by standard error.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len());
        out.push_str(&self.stdout);
        out.push_str(&self.stderr);
        out
    }
}

/// Verbs the lifecycle service needs from an external runtime.
pub trait RuntimeInvoker: Send + Sync {
    /// Launches a container from its bundle in detached mode, directing
    /// the runtime's own log to `log_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime binary cannot be invoked.
    fn run(&self, id: &ContainerId, bundle: &Path, log_path: &Path) -> Result<Invocation>;

    /// Delivers `signal` to the container's processes.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime binary cannot be invoked.
    fn kill(&self, id: &ContainerId, signal: Signal) -> Result<Invocation>;

    /// Runs `sh -c command` inside a running container, capturing output.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime binary cannot be invoked.
    fn exec(&self, id: &ContainerId, command: &str) -> Result<Invocation>;

    /// Drops the runtime's own record of a stopped container.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime binary cannot be invoked.
    fn remove(&self, id: &ContainerId) -> Result<Invocation>;
}

#[derive(Debug, Clone, Copy)]
enum Output {
    Capture,
    Discard,
}

/// [`RuntimeInvoker`] that shells out to an OCI runtime CLI such as `runc`.
#[derive(Debug, Clone)]
pub struct RuncInvoker {
    binary: String,
    timeout: Option<Duration>,
}

impl RuncInvoker {
    /// Creates an invoker for `binary`, looked up through `PATH` at each call.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            timeout: None,
        }
    }

    /// Kills any invocation still running after `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runtime binary this invoker calls.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Returns whether the runtime binary can be found.
    #[must_use]
    pub fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }

    fn execute(
        &self,
        verb: &'static str,
        id: &ContainerId,
        mut command: Command,
        output: Output,
    ) -> Result<Invocation> {
        let _ = command.stdin(Stdio::null());
        match output {
            Output::Capture => {
                let _ = command.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            Output::Discard => {
                let _ = command.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        tracing::debug!(verb, id = %id, binary = %self.binary, "invoking runtime");
        let deadline = self.timeout.map(|limit| Instant::now() + limit);
        let mut child = command.spawn().map_err(|source| self.unavailable(source))?;
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let status = match deadline {
            None => child.wait().map_err(|source| self.unavailable(source))?,
            Some(deadline) => wait_with_deadline(&mut child, deadline)
                .map_err(|source| self.unavailable(source))?
                .ok_or_else(|| self.timed_out(verb, id))?,
        };

        // A process the runtime left behind may still hold the pipes open.
        let stdout = collect(stdout, deadline).ok_or_else(|| self.timed_out(verb, id))?;
        let stderr = collect(stderr, deadline).ok_or_else(|| self.timed_out(verb, id))?;

        let invocation = Invocation::new(status.code(), stdout, stderr);
        tracing::debug!(verb, id = %id, exit_code = ?invocation.exit_code, "runtime returned");
        Ok(invocation)
    }

    fn timed_out(&self, verb: &'static str, id: &ContainerId) -> CorralError {
        let limit = self.timeout.unwrap_or_default();
        tracing::warn!(verb, id = %id, ?limit, "runtime invocation timed out");
        CorralError::RuntimeTimeout {
            verb,
            id: id.to_string(),
            seconds: limit.as_secs(),
        }
    }

    fn unavailable(&self, source: std::io::Error) -> CorralError {
        CorralError::RuntimeUnavailable {
            binary: self.binary.clone(),
            source,
        }
    }
}

impl RuntimeInvoker for RuncInvoker {
    fn run(&self, id: &ContainerId, bundle: &Path, log_path: &Path) -> Result<Invocation> {
        let mut command = Command::new(&self.binary);
        let _ = command
            .arg("--log")
            .arg(log_path)
            .args(["run", "--detach", "--bundle"])
            .arg(bundle)
            .arg(id.as_str());
        // A detached container inherits our stdio; pipes would never close.
        self.execute("run", id, command, Output::Discard)
    }

    fn kill(&self, id: &ContainerId, signal: Signal) -> Result<Invocation> {
        let mut command = Command::new(&self.binary);
        let _ = command.args(["kill", id.as_str(), signal.as_str()]);
        self.execute("kill", id, command, Output::Capture)
    }

    fn exec(&self, id: &ContainerId, cmd: &str) -> Result<Invocation> {
        let mut command = Command::new(&self.binary);
        let _ = command.args(["exec", id.as_str(), "sh", "-c", cmd]);
        self.execute("exec", id, command, Output::Capture)
    }

    fn remove(&self, id: &ContainerId) -> Result<Invocation> {
        let mut command = Command::new(&self.binary);
        let _ = command.args(["delete", "--force", id.as_str()]);
        self.execute("delete", id, command, Output::Capture)
    }
}

/// Waits for `child` until `deadline`, killing it once the deadline passes.
///
/// Returns `Ok(None)` when the child had to be killed.
fn wait_with_deadline(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Drains `source` on its own thread; the buffer arrives once it hits EOF.
fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    drop(std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = source.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    }));
    rx
}

/// Receives a reader's buffer, giving up at `deadline`.
///
/// Returns `None` if the pipe is still open when the deadline passes.
fn collect(reader: Option<Receiver<String>>, deadline: Option<Instant>) -> Option<String> {
    let Some(rx) = reader else {
        return Some(String::new());
    };
    match deadline {
        None => Some(rx.recv().unwrap_or_default()),
        Some(deadline) => match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(text) => Some(text),
            Err(RecvTimeoutError::Disconnected) => Some(String::new()),
            Err(RecvTimeoutError::Timeout) => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> ContainerId {
        ContainerId::new("ctr-1")
    }

    #[test]
    fn combined_joins_stdout_then_stderr() {
        let inv = Invocation::new(Some(1), "out\n", "err\n");
        assert!(!inv.success());
        assert_eq!(inv.combined(), "out\nerr\n");
    }

    #[test]
    fn signal_terminated_invocation_is_not_success() {
        assert!(!Invocation::new(None, "", "").success());
        assert!(Invocation::succeeded("").success());
    }

    #[test]
    fn missing_binary_is_runtime_unavailable() {
        let invoker = RuncInvoker::new("corral-test-no-such-runtime");
        assert!(!invoker.is_available());

        let err = invoker.kill(&id(), Signal::SIGTERM).unwrap_err();
        assert!(matches!(err, CorralError::RuntimeUnavailable { .. }));
    }

    #[test]
    fn exec_passes_shell_wrapped_command() {
        // `echo` stands in for the runtime and reflects the argument vector.
        let invoker = RuncInvoker::new("echo");
        let inv = invoker.exec(&id(), "echo hi").unwrap();
        assert!(inv.success());
        assert_eq!(inv.stdout.trim(), "exec ctr-1 sh -c echo hi");
    }

    #[test]
    fn kill_passes_signal_name() {
        let invoker = RuncInvoker::new("echo");
        let inv = invoker.kill(&id(), Signal::SIGKILL).unwrap();
        assert_eq!(inv.stdout.trim(), "kill ctr-1 SIGKILL");
    }

    #[test]
    fn non_zero_exit_is_reported_not_raised() {
        let invoker = RuncInvoker::new("false");
        let inv = invoker.remove(&id()).unwrap();
        assert!(!inv.success());
        assert_eq!(inv.exit_code, Some(1));
    }

    #[test]
    fn run_discards_output() {
        let invoker = RuncInvoker::new("echo");
        let inv = invoker
            .run(&id(), Path::new("/tmp/bundle"), Path::new("/tmp/bundle/log.json"))
            .unwrap();
        assert!(inv.success());
        assert!(inv.stdout.is_empty());
    }

    #[test]
    fn deadline_kills_slow_child() {
        let mut child = Command::new("sleep").arg("5").spawn().unwrap();
        let started = Instant::now();
        let status = wait_with_deadline(&mut child, started + Duration::from_millis(100)).unwrap();
        assert!(status.is_none());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn deadline_returns_status_of_fast_child() {
        let mut child = Command::new("true").spawn().unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        let status = wait_with_deadline(&mut child, deadline).unwrap();
        assert!(status.is_some_and(|s| s.success()));
    }

    #[test]
    fn timeout_covers_pipes_held_by_leftover_process() {
        // The runtime exits at once but leaves a process holding its stdout.
        let invoker = RuncInvoker::new("sh").with_timeout(Some(Duration::from_secs(1)));
        let mut command = Command::new("sh");
        let _ = command.args(["-c", "sleep 5 & echo launched"]);

        let started = Instant::now();
        let err = invoker
            .execute("exec", &id(), command, Output::Capture)
            .unwrap_err();
        assert!(matches!(
            err,
            CorralError::RuntimeTimeout {
                verb: "exec",
                seconds: 1,
                ..
            }
        ));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn output_is_captured_within_timeout() {
        let invoker = RuncInvoker::new("echo").with_timeout(Some(Duration::from_secs(5)));
        let inv = invoker.kill(&id(), Signal::SIGTERM).unwrap();
        assert!(inv.success());
        assert_eq!(inv.stdout.trim(), "kill ctr-1 SIGTERM");
    }
}
