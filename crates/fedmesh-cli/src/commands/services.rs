//! `fedmesh up` and `fedmesh down`.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use fedmesh_core::config::load_config;
use fedmesh_discovery::restart::{DEFAULT_POLL_EVERY, wait_for_new_url};

use super::Global;
use crate::compose::ServiceController;
use crate::context::{NodeArgs, resolve_config, url_source};

#[derive(clap::Args, Debug)]
pub struct UpArgs {
    #[command(flatten)]
    pub node: NodeArgs,

    /// Seconds to wait for the tunnel to report its URL
    #[arg(long, default_value_t = 120)]
    pub wait_secs: u64,
}

/// Start the node's services with the store credentials injected, then wait
/// for the tunnel URL.
pub async fn up(args: &UpArgs, global: &Global) -> Result<()> {
    let config = resolve_config(&global.project_dir, &args.node).await?;
    let token = config.store_token()?;
    let repo = config.store_repo()?;
    let node = config.node_name()?;

    let mut out = io::stdout();
    writeln!(out, "Repo: {repo}")?;
    writeln!(out, "Node: {node}")?;

    let services = ServiceController::detect(&config.tunnel.service).await?;
    services
        .up(&[("GITHUB_TOKEN", token), ("GITHUB_REPO", repo), ("NODE_NAME", node)])
        .await?;

    let source = url_source(&config, Some(&services))?;
    writeln!(out, "Waiting for tunnel URL (up to {}s)...", args.wait_secs)?;
    let url = wait_for_new_url(
        source.as_ref(),
        None,
        Duration::from_secs(args.wait_secs),
        DEFAULT_POLL_EVERY,
    )
    .await
    .ok_or_else(|| {
        anyhow!(
            "tunnel URL not found after {}s; check the `{}` service logs",
            args.wait_secs,
            config.tunnel.service
        )
    })?;

    writeln!(out)?;
    writeln!(out, "  Chat server: {}", config.local.server_url)?;
    writeln!(out, "  Web client:  {}", config.local.web_url)?;
    writeln!(out, "  Tunnel:      {url}")?;
    writeln!(out)?;
    writeln!(out, "The watcher re-publishes the URL whenever it changes.")?;
    Ok(())
}

pub async fn down(global: &Global) -> Result<()> {
    let config = load_config(Some(&global.project_dir)).context("failed to load configuration")?;
    let services = ServiceController::detect(&config.tunnel.service).await?;
    services.down().await?;
    writeln!(io::stdout(), "Services stopped.")?;
    Ok(())
}
