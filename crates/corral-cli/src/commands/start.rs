//! `corral start` — Start a container.

use clap::Args;
use corral_common::config::CorralConfig;
use corral_common::types::ContainerId;

/// Arguments for the `start` command.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Container ID.
    pub container: String,
}

/// Executes the `start` command.
///
/// # Errors
///
/// Returns an error if the daemon is unreachable or reports a hard failure.
pub async fn execute(args: StartArgs, config: &CorralConfig) -> anyhow::Result<()> {
    let mut client = super::connect(config).await?;
    let id = ContainerId::new(args.container);
    if client.start(&id).await? {
        println!("Container started successfully");
    } else {
        println!("Failed to start container");
    }
    Ok(())
}
