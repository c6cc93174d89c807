//! `corral exec` — Execute a command inside a running container.

use clap::Args;
use corral_common::config::CorralConfig;
use corral_common::types::ContainerId;

/// Arguments for the `exec` command.
#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Container ID.
    pub container: String,

    /// Shell command to run, passed to `sh -c`.
    pub command: String,
}

/// Executes the `exec` command.
///
/// Prints the combined output. Exits with status 1 when the container is
/// not running or the command fails.
///
/// # Errors
///
/// Returns an error if the daemon is unreachable or reports a hard failure.
pub async fn execute(args: ExecArgs, config: &CorralConfig) -> anyhow::Result<()> {
    let mut client = super::connect(config).await?;
    let id = ContainerId::new(args.container);
    let reply = client.exec(&id, &args.command).await?;

    if reply.success {
        print!("{}", reply.output);
        return Ok(());
    }

    if !reply.output.is_empty() {
        print!("{}", reply.output);
    }
    #[allow(clippy::print_stderr)]
    {
        eprintln!("Failed to execute command in {id}");
    }
    std::process::exit(1);
}
