//! Forced tunnel rotation.
//!
//! Quick tunnels hand out a fresh hostname on every start, so a restart is
//! only complete once the source reports a URL different from the old one.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::source::UrlSource;

/// Default interval between source checks while waiting for a new URL.
pub const DEFAULT_POLL_EVERY: Duration = Duration::from_secs(2);

/// The process that owns the tunnel.
#[async_trait]
pub trait TunnelDaemon: Send + Sync {
    /// Tear the tunnel down and start a fresh one.
    async fn recreate(&self) -> io::Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum RestartError {
    #[error("failed to clear the previous tunnel URL: {0}")]
    Invalidate(#[source] io::Error),

    #[error("failed to recreate the tunnel service: {0}")]
    Recreate(#[source] io::Error),

    #[error("no new tunnel URL within {secs}s")]
    Timeout { secs: u64 },
}

/// Poll `source` until it reports a URL other than `previous`.
///
/// Returns `None` once `timeout` elapses without one.
pub async fn wait_for_new_url<U: UrlSource + ?Sized>(
    source: &U,
    previous: Option<&str>,
    timeout: Duration,
    poll_every: Duration,
) -> Option<String> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(url) = source.current_url().await {
            if previous != Some(url.as_str()) {
                return Some(url);
            }
            debug!(%url, "Tunnel still reports the previous URL");
        }

        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        sleep(poll_every.min(deadline - now)).await;
    }
}

/// Force the tunnel onto a new URL and return it.
pub async fn restart_tunnel<U, D>(
    source: &U,
    daemon: &D,
    timeout: Duration,
    poll_every: Duration,
) -> Result<String, RestartError>
where
    U: UrlSource + ?Sized,
    D: TunnelDaemon + ?Sized,
{
    let previous = source.current_url().await;
    info!(previous = ?previous, source = %source.describe(), "Restarting tunnel");

    source.invalidate().await.map_err(RestartError::Invalidate)?;
    daemon.recreate().await.map_err(RestartError::Recreate)?;

    match wait_for_new_url(source, previous.as_deref(), timeout, poll_every).await {
        Some(url) => {
            info!(%url, "Tunnel restarted");
            Ok(url)
        }
        None => {
            warn!(timeout_secs = timeout.as_secs(), "Tunnel did not report a new URL");
            Err(RestartError::Timeout {
                secs: timeout.as_secs(),
            })
        }
    }
}
