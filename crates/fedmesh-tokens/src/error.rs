use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("no admin access token available; run `fedmesh token configure --token <TOKEN>`")]
    CredentialMissing,

    #[error("no admin session at {}; run `fedmesh token configure`", .0.display())]
    ConfigMissing(PathBuf),

    #[error("cannot determine home directory for the admin session file")]
    NoHomeDir,

    #[error("invalid duration {input:?}: {reason}")]
    DurationParse { input: String, reason: String },

    #[error("admin API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid server URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TokenError>;
