//! Tunnel watcher: poll the URL source, publish when it changes.
//!
//! The last published URL lives only in memory. After a restart the first
//! observed URL is published again, which is harmless because publishing the
//! same record twice leaves the document unchanged in content.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::error::PublishError;
use crate::publisher::Publisher;
use crate::source::UrlSource;
use crate::store::ContentStore;

/// What one poll cycle did.
#[derive(Debug)]
pub enum PollOutcome {
    /// The source had no URL.
    NoUrl,
    /// The URL equals the last published one; the store was not touched.
    Unchanged,
    /// A new URL was published.
    Published(String),
    /// Publishing a new URL failed; it will be retried on the next poll.
    Failed(PublishError),
}

pub struct TunnelWatcher<U, S> {
    source: U,
    publisher: Publisher<S>,
    node_name: String,
    poll_interval: Duration,
    last_published_url: Option<String>,
}

impl<U: UrlSource, S: ContentStore> TunnelWatcher<U, S> {
    pub fn new(
        source: U,
        publisher: Publisher<S>,
        node_name: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            publisher,
            node_name: node_name.into(),
            poll_interval,
            last_published_url: None,
        }
    }

    pub fn last_published_url(&self) -> Option<&str> {
        self.last_published_url.as_deref()
    }

    /// Run one observation and, if the URL changed, one publish attempt.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let Some(url) = self.source.current_url().await else {
            debug!(source = %self.source.describe(), "No tunnel URL yet, waiting");
            return PollOutcome::NoUrl;
        };

        if self.last_published_url.as_deref() == Some(url.as_str()) {
            return PollOutcome::Unchanged;
        }

        info!(%url, previous = ?self.last_published_url, "Detected tunnel URL");
        match self.publisher.publish(&self.node_name, &url).await {
            Ok(()) => {
                self.last_published_url = Some(url.clone());
                PollOutcome::Published(url)
            }
            Err(e) => {
                error!(%url, error = %e, "Publish failed, will retry on next poll");
                PollOutcome::Failed(e)
            }
        }
    }

    /// Poll forever until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Shutdown is only observed while sleeping between polls, so a publish
    /// in flight always runs to completion or to its own timeout.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            node = %self.node_name,
            source = %self.source.describe(),
            poll_interval_secs = self.poll_interval.as_secs(),
            "Starting tunnel watcher"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.poll_once().await;

            tokio::select! {
                () = sleep(self.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(last_published = ?self.last_published_url, "Tunnel watcher shutting down");
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
