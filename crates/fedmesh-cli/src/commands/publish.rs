//! `fedmesh publish`: one-shot publish of the current tunnel URL.

use std::io::{self, Write};

use anyhow::{Result, bail};

use super::Global;
use crate::compose::ServiceController;
use crate::context::{NodeArgs, publisher, resolve_config, url_source};

#[derive(clap::Args, Debug)]
pub struct PublishArgs {
    #[command(flatten)]
    pub node: NodeArgs,
}

pub async fn run(args: &PublishArgs, global: &Global) -> Result<()> {
    let config = resolve_config(&global.project_dir, &args.node).await?;
    let node = config.node_name()?;

    let services = ServiceController::detect(&config.tunnel.service).await.ok();
    let source = url_source(&config, services.as_ref())?;
    let Some(url) = source.current_url().await else {
        bail!("no tunnel URL to publish ({})", source.describe());
    };

    let publisher = publisher(&config)?;
    publisher.publish(node, &url).await?;

    writeln!(
        io::stdout(),
        "Published {url} to {}",
        publisher.document_path(node)
    )?;
    Ok(())
}
