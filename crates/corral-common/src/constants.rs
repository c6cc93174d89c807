//! System-wide constants and default paths.

/// Default parent directory of every container bundle.
pub const DEFAULT_SCRATCH_ROOT: &str = "/tmp/corral";

/// Default Unix socket the daemon listens on.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/corral.sock";

/// Default external OCI runtime binary, resolved through `PATH`.
pub const DEFAULT_RUNTIME_BINARY: &str = "runc";

/// Signal delivered by `stop` unless configured otherwise.
pub const DEFAULT_STOP_SIGNAL: &str = "SIGTERM";

/// Unprivileged uid/gid (`nobody`) written into every bundle.
pub const DEFAULT_UNPRIVILEGED_ID: u32 = 65534;

/// OCI runtime specification version declared by generated bundles.
pub const OCI_VERSION: &str = "1.0.2";

/// `PATH` handed to the container's entrypoint process.
pub const CONTAINER_PATH_ENV: &str =
    "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

/// File name of the runtime configuration document inside a bundle.
pub const BUNDLE_CONFIG_FILE: &str = "config.json";

/// File name of the runtime log artifact inside a bundle.
pub const BUNDLE_LOG_FILE: &str = "log.json";

/// Prefix of every generated container identifier.
pub const CONTAINER_ID_PREFIX: &str = "ctr-";

/// Text returned by log retrieval when no log artifact can be read.
pub const NO_LOGS_SENTINEL: &str = "No logs available";

/// Application name used in CLI output.
pub const APP_NAME: &str = "corral";
