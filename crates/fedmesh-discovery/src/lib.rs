//! fedmesh tunnel discovery.
//!
//! Detects a node's current tunnel URL, publishes it to the shared content
//! store with optimistic concurrency, and re-derives liveness of published
//! URLs:
//! - [`source`]: where the current tunnel URL comes from (file or daemon log)
//! - [`store`]: versioned remote documents (GitHub contents API)
//! - [`publisher`]: read-modify-write of a node's `server.json`
//! - [`verifier`]: DNS + health probe classification
//! - [`watcher`]: the poll-and-publish driver loop
//! - [`restart`]: waiting for a fresh URL after recreating the tunnel

pub mod directory;
pub mod error;
pub mod publisher;
pub mod restart;
pub mod source;
pub mod store;
pub mod verifier;
pub mod watcher;

pub use directory::Directory;
pub use error::{PublishError, StoreError};
pub use publisher::Publisher;
pub use restart::{RestartError, TunnelDaemon, restart_tunnel};
pub use source::{FileSource, LogSource, UrlSource};
pub use store::{ContentStore, GitHubContentStore, RemoteDocument, RemoteDocumentHandle};
pub use verifier::{VerificationResult, Verifier};
pub use watcher::{PollOutcome, TunnelWatcher};

/// Install the process-wide rustls crypto provider.
///
/// reqwest is built with `rustls-no-provider`; the `Err` case just means a
/// provider was already installed.
pub(crate) fn ensure_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
