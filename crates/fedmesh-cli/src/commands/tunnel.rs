//! `fedmesh tunnel`: inspect or rotate the tunnel URL.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Subcommand;
use fedmesh_discovery::restart::DEFAULT_POLL_EVERY;
use fedmesh_discovery::{Verifier, restart_tunnel};

use super::Global;
use crate::compose::ServiceController;
use crate::context::{NodeArgs, resolve_config, url_source};

#[derive(clap::Args, Debug)]
pub struct TunnelArgs {
    #[command(subcommand)]
    pub action: TunnelAction,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Subcommand, Debug)]
pub enum TunnelAction {
    /// Recreate the tunnel and wait for a new URL
    Restart {
        /// Seconds to wait for the new URL (defaults to tunnel.restart_timeout_secs)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Print the current tunnel URL and whether it is live
    Url,
}

pub async fn run(args: &TunnelArgs, global: &Global) -> Result<()> {
    let config = resolve_config(&global.project_dir, &args.node).await?;
    let mut out = io::stdout();

    match &args.action {
        TunnelAction::Restart { timeout_secs } => {
            let secs = timeout_secs.unwrap_or(config.tunnel.restart_timeout_secs);
            let services = ServiceController::detect(&config.tunnel.service).await?;
            let source = url_source(&config, Some(&services))?;
            writeln!(out, "Restarting tunnel (waiting up to {secs}s for a new URL)...")?;
            let url = restart_tunnel(
                source.as_ref(),
                &services,
                Duration::from_secs(secs),
                DEFAULT_POLL_EVERY,
            )
            .await?;
            writeln!(out, "New tunnel URL: {url}")?;
            writeln!(out, "The watcher will publish it on its next poll.")?;
        }
        TunnelAction::Url => {
            let services = ServiceController::detect(&config.tunnel.service).await.ok();
            let source = url_source(&config, services.as_ref())?;
            let Some(url) = source.current_url().await else {
                bail!(
                    "no tunnel URL found ({}); is the `{}` service running?",
                    source.describe(),
                    config.tunnel.service
                );
            };
            writeln!(out, "{url}")?;

            let verification = Verifier::new()?.verify_detailed(&url).await;
            for addr in &verification.addresses {
                writeln!(out, "  address: {addr}")?;
            }
            writeln!(out, "  status:  {}", verification.result)?;
            if let Some(remedy) = verification.result.remedy() {
                bail!("tunnel URL is not live: {remedy}");
            }
        }
    }
    Ok(())
}
