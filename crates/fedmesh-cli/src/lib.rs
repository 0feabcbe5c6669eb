pub mod cmd;
pub mod commands;
pub mod compose;
pub mod context;
pub mod github_env;
pub mod prompt;
pub mod token_fmt;

/// Install the process-wide rustls crypto provider used by every HTTP client.
///
/// The `Err` case just means a provider was already installed.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
