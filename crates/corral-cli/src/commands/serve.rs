//! `corral serve` — Run the lifecycle daemon.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use corral_common::config::CorralConfig;
use corral_rpc::Server;
use corral_runtime::service::LifecycleService;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Directory holding container bundles.
    #[arg(long, env = "CORRAL_SCRATCH_ROOT")]
    pub scratch_root: Option<PathBuf>,

    /// OCI runtime binary to invoke.
    #[arg(long, env = "CORRAL_RUNTIME")]
    pub runtime: Option<String>,

    /// Kill runtime invocations that take longer than this many seconds.
    #[arg(long, value_name = "SECS")]
    pub invoke_timeout: Option<u64>,
}

impl ServeArgs {
    fn apply(self, config: &mut CorralConfig) {
        if let Some(root) = self.scratch_root {
            config.scratch_root = root;
        }
        if let Some(runtime) = self.runtime {
            config.runtime_binary = runtime;
        }
        if self.invoke_timeout.is_some() {
            config.invoke_timeout_secs = self.invoke_timeout;
        }
    }
}

/// Executes the `serve` command.
///
/// Binds the daemon socket and serves requests until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the socket cannot
/// be bound.
pub async fn execute(args: ServeArgs, mut config: CorralConfig) -> anyhow::Result<()> {
    args.apply(&mut config);
    config.validate()?;
    tracing::info!(
        scratch_root = %config.scratch_root.display(),
        runtime = %config.runtime_binary,
        timeout_secs = ?config.invoke_timeout_secs,
        "starting daemon"
    );

    let service = Arc::new(LifecycleService::new(&config)?);
    let server = Server::bind(&config.socket_path, service)?;
    server
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for Ctrl-C");
            }
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let mut config = CorralConfig::default();
        ServeArgs {
            scratch_root: Some(PathBuf::from("/var/tmp/corral")),
            runtime: Some("crun".into()),
            invoke_timeout: Some(10),
        }
        .apply(&mut config);

        assert_eq!(config.scratch_root, PathBuf::from("/var/tmp/corral"));
        assert_eq!(config.runtime_binary, "crun");
        assert_eq!(config.invoke_timeout_secs, Some(10));
    }

    #[test]
    fn absent_flags_keep_config() {
        let mut config = CorralConfig {
            invoke_timeout_secs: Some(3),
            ..CorralConfig::default()
        };
        ServeArgs {
            scratch_root: None,
            runtime: None,
            invoke_timeout: None,
        }
        .apply(&mut config);
        assert_eq!(config, CorralConfig {
            invoke_timeout_secs: Some(3),
            ..CorralConfig::default()
        });
    }
}
