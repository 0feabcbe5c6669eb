//! Discovery error types.

/// Maximum number of characters of a response body kept in an error.
pub const BODY_EXCERPT_LEN: usize = 200;

/// Errors returned by a [`crate::ContentStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The document's version tag no longer matches the one supplied.
    #[error("version conflict on {path}: document changed since it was read")]
    Conflict { path: String },

    /// Transport failure or unexpected HTTP status.
    #[error("content store request failed{}: {}", fmt_status(.status), .body_excerpt)]
    Transport {
        status: Option<u16>,
        body_excerpt: String,
    },

    /// The store client cannot be built from the given settings.
    #[error("content store configuration error: {0}")]
    Config(String),

    /// The store answered with something that is not a document.
    #[error("malformed content store response: {0}")]
    Decode(String),
}

impl StoreError {
    pub(crate) fn transport(status: Option<u16>, body: &str) -> Self {
        Self::Transport {
            status,
            body_excerpt: excerpt(body),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        Self::transport(e.status().map(|s| s.as_u16()), &e.to_string())
    }
}

/// Errors from [`crate::Publisher::publish`].
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Another writer updated the document between our read and our write.
    #[error("publish lost a race: {path} was updated concurrently")]
    Conflict { path: String },

    #[error("publish failed{}: {}", fmt_status(.status), .body_excerpt)]
    Transport {
        status: Option<u16>,
        body_excerpt: String,
    },

    #[error(transparent)]
    InvalidRecord(#[from] fedmesh_core::Error),
}

impl From<StoreError> for PublishError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { path } => Self::Conflict { path },
            StoreError::Transport {
                status,
                body_excerpt,
            } => Self::Transport {
                status,
                body_excerpt,
            },
            StoreError::Config(msg) | StoreError::Decode(msg) => Self::Transport {
                status: None,
                body_excerpt: excerpt(&msg),
            },
        }
    }
}

#[allow(clippy::ref_option)]
fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// First [`BODY_EXCERPT_LEN`] characters of `body`.
pub(crate) fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LEN).collect()
}
