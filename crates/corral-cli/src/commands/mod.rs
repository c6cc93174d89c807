//! CLI command definitions and dispatch.

pub mod create;
pub mod delete;
pub mod exec;
pub mod list;
pub mod logs;
pub mod serve;
pub mod start;
pub mod stop;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use corral_common::config::CorralConfig;
use corral_rpc::Client;

/// Corral — single-node container lifecycle manager.
#[derive(Parser, Debug)]
#[command(name = "corral", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// JSON configuration file.
    #[arg(long, global = true, env = "CORRAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Daemon socket path (overrides the configuration file).
    #[arg(long, global = true, env = "CORRAL_SOCKET")]
    pub socket: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the daemon in the foreground.
    Serve(serve::ServeArgs),
    /// Create a new container.
    Create(create::CreateArgs),
    /// Start a container.
    Start(start::StartArgs),
    /// Stop a running container.
    Stop(stop::StopArgs),
    /// Delete a container that is not running.
    Delete(delete::DeleteArgs),
    /// Execute a command in a running container.
    Exec(exec::ExecArgs),
    /// List all containers.
    List,
    /// Show a container's runtime log.
    Logs(logs::LogsArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if configuration loading, the daemon connection, or
/// the command itself fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    match cli.command {
        Command::Serve(args) => serve::execute(args, config).await,
        Command::Create(args) => create::execute(args, &config).await,
        Command::Start(args) => start::execute(args, &config).await,
        Command::Stop(args) => stop::execute(args, &config).await,
        Command::Delete(args) => delete::execute(args, &config).await,
        Command::Exec(args) => exec::execute(args, &config).await,
        Command::List => list::execute(&config).await,
        Command::Logs(args) => logs::execute(args, &config).await,
    }
}

/// Loads the configuration file, if any, and applies global overrides.
fn resolve_config(cli: &Cli) -> anyhow::Result<CorralConfig> {
    let mut config = match &cli.config {
        Some(path) => CorralConfig::load(path)?,
        None => CorralConfig::default(),
    };
    if let Some(socket) = &cli.socket {
        config.socket_path.clone_from(socket);
    }
    Ok(config)
}

/// Opens a client connection to the configured daemon socket.
async fn connect(config: &CorralConfig) -> anyhow::Result<Client> {
    Client::connect(&config.socket_path).await.map_err(|e| {
        anyhow::anyhow!(
            "cannot reach daemon at {} (is `corral serve` running?): {e}",
            config.socket_path.display()
        )
    })
}
