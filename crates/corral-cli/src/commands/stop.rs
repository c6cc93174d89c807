//! `corral stop` — Stop a running container.

use clap::Args;
use corral_common::config::CorralConfig;
use corral_common::types::ContainerId;

/// Arguments for the `stop` command.
#[derive(Args, Debug)]
pub struct StopArgs {
    /// Container ID.
    pub container: String,
}

/// Executes the `stop` command.
///
/// # Errors
///
/// Returns an error if the daemon is unreachable or reports a hard failure.
pub async fn execute(args: StopArgs, config: &CorralConfig) -> anyhow::Result<()> {
    let mut client = super::connect(config).await?;
    let id = ContainerId::new(args.container);
    if client.stop(&id).await? {
        println!("Container stopped successfully");
    } else {
        println!("Failed to stop container (is it running?)");
    }
    Ok(())
}
