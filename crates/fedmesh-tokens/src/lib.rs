//! Registration token lifecycle for a fedmesh node.
//!
//! Token state lives on the chat server; nothing here caches it. Every
//! operation goes to the admin API with the credentials of the locally
//! persisted [`AdminSession`].

pub mod client;
pub mod duration;
pub mod error;
pub mod manager;
pub mod session;
pub mod token;

pub use client::AdminClient;
pub use duration::{expiry_deadline, parse_duration};
pub use error::{Result, TokenError};
pub use manager::{RevokeOutcome, TokenListing, TokenManager};
pub use session::{AdminSession, SessionField, SessionFlags, configure};
pub use token::{RegistrationToken, TokenStatus};

/// reqwest is built with `rustls-no-provider`; a second install is a no-op.
pub(crate) fn ensure_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
