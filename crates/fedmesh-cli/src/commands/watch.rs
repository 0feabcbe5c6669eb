//! `fedmesh watch`: long-running poll-and-publish loop.

use anyhow::{Context, Result, bail};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use fedmesh_discovery::TunnelWatcher;

use super::Global;
use crate::compose::ServiceController;
use crate::context::{NodeArgs, publisher, resolve_config, url_source};

#[derive(clap::Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub node: NodeArgs,

    /// Seconds between polls (overrides watcher.poll_interval_secs)
    #[arg(long)]
    pub interval_secs: Option<u64>,
}

pub async fn run(args: &WatchArgs, global: &Global) -> Result<()> {
    let mut config = resolve_config(&global.project_dir, &args.node).await?;
    if let Some(secs) = args.interval_secs {
        config.watcher.poll_interval_secs = secs;
    }
    let node = config.node_name()?.to_string();

    let services = ServiceController::detect(&config.tunnel.service).await.ok();
    let source = url_source(&config, services.as_ref())?;
    let watcher = TunnelWatcher::new(
        source,
        publisher(&config)?,
        node,
        config.watcher.poll_interval(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(watcher.run(shutdown_rx));

    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    // `true` unsets $NOTIFY_SOCKET so the compose subprocesses never see it.
    #[cfg(unix)]
    sd_notify::notify(true, &[sd_notify::NotifyState::Ready])?;

    #[cfg(unix)]
    let sigterm_future = sigterm.recv();
    #[cfg(not(unix))]
    let sigterm_future = std::future::pending::<Option<()>>();

    let stop = async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C shutdown signal");
            }
            _ = sigterm_future => {
                info!("Received SIGTERM shutdown signal");
            }
        }
    };

    supervise(handle, shutdown_tx, stop).await?;
    info!("Watcher stopped");
    Ok(())
}

/// Wait for `stop`, then ask the watcher task to finish and join it.
///
/// A task that ends on its own, or panics, is an error.
pub async fn supervise(
    mut handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
    stop: impl Future<Output = ()>,
) -> Result<()> {
    tokio::select! {
        () = stop => {}
        joined = &mut handle => {
            joined.context("watcher task failed")?;
            bail!("watcher stopped before a shutdown signal");
        }
    }

    let _ = shutdown_tx.send(true);
    handle.await.context("watcher task failed")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_signal_shuts_the_task_down() {
        let (tx, mut rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            while !*rx.borrow() {
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
        supervise(handle, tx, async {}).await.unwrap();
    }

    #[tokio::test]
    async fn panicked_task_is_reported() {
        let (tx, _rx) = watch::channel(false);
        let handle: JoinHandle<()> = tokio::spawn(async { panic!("publisher exploded") });
        let err = supervise(handle, tx, std::future::pending()).await.unwrap_err();
        assert!(err.to_string().contains("watcher task failed"), "{err:#}");
    }

    #[tokio::test]
    async fn early_exit_is_an_error() {
        let (tx, _rx) = watch::channel(false);
        let handle = tokio::spawn(async {});
        let err = supervise(handle, tx, std::future::pending()).await.unwrap_err();
        assert!(err.to_string().contains("before a shutdown signal"), "{err}");
    }
}
