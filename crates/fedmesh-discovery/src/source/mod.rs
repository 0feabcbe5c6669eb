//! Tunnel URL sources.
//!
//! A source answers one question: what public URL does the tunnel daemon
//! currently advertise? Two strategies exist, a shared file written by a
//! sidecar and the daemon's own log output. Callers only see [`UrlSource`].

mod file;
mod log;

use async_trait::async_trait;

pub use file::FileSource;
pub use log::{CommandLogFeed, LogFeed, LogSource, last_tunnel_url};

/// Capability interface over the current tunnel URL.
#[async_trait]
pub trait UrlSource: Send + Sync {
    /// The current URL, or `None` when none is known yet.
    ///
    /// Never fails: an unreadable source is reported as `None` and logged.
    async fn current_url(&self) -> Option<String>;

    /// Forget any locally cached URL so a stale value cannot be read back.
    async fn invalidate(&self) -> std::io::Result<()> {
        Ok(())
    }

    /// Short description for log lines.
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: UrlSource + ?Sized> UrlSource for Box<T> {
    async fn current_url(&self) -> Option<String> {
        (**self).current_url().await
    }

    async fn invalidate(&self) -> std::io::Result<()> {
        (**self).invalidate().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
