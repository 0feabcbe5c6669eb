use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use super::UrlSource;

/// Reads the URL from a file shared with the tunnel sidecar.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UrlSource for FileSource {
    async fn current_url(&self) -> Option<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let url = content.trim();
                (!url.is_empty()).then(|| url.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read tunnel URL file");
                None
            }
        }
    }

    async fn invalidate(&self) -> std::io::Result<()> {
        match tokio::fs::metadata(&self.path).await {
            Ok(_) => tokio::fs::write(&self.path, "").await,
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
