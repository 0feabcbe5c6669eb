use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use fedmesh_cli::commands::publish::PublishArgs;
use fedmesh_cli::commands::services::UpArgs;
use fedmesh_cli::commands::status::StatusArgs;
use fedmesh_cli::commands::token::TokenArgs;
use fedmesh_cli::commands::tunnel::TunnelArgs;
use fedmesh_cli::commands::watch::WatchArgs;
use fedmesh_cli::commands::{self, Global};

/// Operate a federated chat node behind a quick tunnel.
#[derive(Debug, Parser)]
#[command(name = "fedmesh", version, about)]
struct Cli {
    /// Project directory holding the compose file and `.fedmesh/settings.json`
    #[arg(
        short = 'C',
        long,
        global = true,
        default_value = ".",
        env = "FEDMESH_PROJECT_DIR"
    )]
    project_dir: PathBuf,

    /// Run without interactive prompts (use defaults or CLI flags)
    #[arg(long, global = true)]
    non_interactive: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "FEDMESH_LOG_JSON")]
    log_json: bool,

    /// Log level for fedmesh crates when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info", env = "FEDMESH_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the node's services and wait for the tunnel URL
    Up(UpArgs),
    /// Stop the node's services
    Down,
    /// Diagnose services, tunnel, published record and federation
    Status(StatusArgs),
    /// Inspect or restart the tunnel
    Tunnel(TunnelArgs),
    /// Publish the current tunnel URL once
    Publish(PublishArgs),
    /// Publish the tunnel URL whenever it changes
    Watch(WatchArgs),
    /// Manage registration tokens
    Token(TokenArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = ["fedmesh_cli", "fedmesh_core", "fedmesh_discovery", "fedmesh_tokens"]
        .map(|target| format!("{target}={}", cli.log_level))
        .join(",");
    fedmesh_core::tracing_init::init_tracing(&filter, cli.log_json);
    fedmesh_cli::install_crypto_provider();

    let project_dir = std::fs::canonicalize(&cli.project_dir).with_context(|| {
        format!("project directory {} not found", cli.project_dir.display())
    })?;
    std::env::set_current_dir(&project_dir)
        .with_context(|| format!("cannot enter {}", project_dir.display()))?;
    let global = Global {
        project_dir,
        non_interactive: cli.non_interactive,
    };

    match cli.command {
        Commands::Up(args) => commands::services::up(&args, &global).await?,
        Commands::Down => commands::services::down(&global).await?,
        Commands::Status(args) => commands::status::run(&args, &global).await?,
        Commands::Tunnel(args) => commands::tunnel::run(&args, &global).await?,
        Commands::Publish(args) => commands::publish::run(&args, &global).await?,
        Commands::Watch(args) => commands::watch::run(&args, &global).await?,
        Commands::Token(args) => commands::token::run(args, &global).await?,
    }

    Ok(())
}
