//! `corral logs` — View a container's runtime log.

use clap::Args;
use corral_common::config::CorralConfig;
use corral_common::types::ContainerId;

/// Arguments for the `logs` command.
#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Container ID.
    pub container: String,
}

/// Executes the `logs` command.
///
/// # Errors
///
/// Returns an error if the daemon is unreachable.
pub async fn execute(args: LogsArgs, config: &CorralConfig) -> anyhow::Result<()> {
    let mut client = super::connect(config).await?;
    let reply = client.get_logs(&ContainerId::new(args.container)).await?;

    if reply.success {
        print!("{}", reply.logs);
    } else {
        println!("{}", reply.logs);
    }
    Ok(())
}
