//! `corral delete` — Delete a container that is not running.

use clap::Args;
use corral_common::config::CorralConfig;
use corral_common::types::ContainerId;

/// Arguments for the `delete` command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Container ID.
    pub container: String,
}

/// Executes the `delete` command.
///
/// # Errors
///
/// Returns an error if the daemon is unreachable or reports a hard failure.
pub async fn execute(args: DeleteArgs, config: &CorralConfig) -> anyhow::Result<()> {
    let mut client = super::connect(config).await?;
    let id = ContainerId::new(args.container);
    if client.delete(&id).await? {
        println!("Container deleted successfully");
    } else {
        println!("Failed to delete container (ensure it is not running)");
    }
    Ok(())
}
