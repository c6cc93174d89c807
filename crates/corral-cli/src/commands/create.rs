//! `corral create` — Register a container and prepare its bundle.

use clap::Args;
use corral_common::config::CorralConfig;

/// Arguments for the `create` command.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Root filesystem path used as the bundle root.
    pub image: String,
    /// Display name, also the container hostname.
    pub name: String,
    /// Shell command run as the entrypoint.
    pub command: String,
}

/// Executes the `create` command.
///
/// # Errors
///
/// Returns an error if the daemon is unreachable or rejects the request.
pub async fn execute(args: CreateArgs, config: &CorralConfig) -> anyhow::Result<()> {
    let mut client = super::connect(config).await?;
    let id = client.create(&args.image, &args.name, &args.command).await?;
    println!("Container created with ID: {id}");
    Ok(())
}
