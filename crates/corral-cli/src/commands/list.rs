//! `corral list` — List all containers.

use corral_common::config::CorralConfig;

use crate::output;

/// Executes the `list` command.
///
/// # Errors
///
/// Returns an error if the daemon is unreachable.
pub async fn execute(config: &CorralConfig) -> anyhow::Result<()> {
    let mut client = super::connect(config).await?;
    let containers = client.list().await?;

    if containers.is_empty() {
        println!("No containers found.");
        return Ok(());
    }
    print!("{}", output::container_table(&containers));
    Ok(())
}
