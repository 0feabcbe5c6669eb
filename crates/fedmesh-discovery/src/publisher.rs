//! Discovery publisher: read-modify-write of a node's `server.json`.

use std::path::PathBuf;

use fedmesh_core::{TunnelRecord, validate_node_name};
use tracing::{info, warn};

use crate::error::PublishError;
use crate::store::{ContentStore, document_path};

/// Writes [`TunnelRecord`]s to a [`ContentStore`].
pub struct Publisher<S> {
    store: S,
    documents_dir: String,
    mirror_path: Option<PathBuf>,
}

impl<S: ContentStore> Publisher<S> {
    pub fn new(store: S, documents_dir: impl Into<String>) -> Self {
        Self {
            store,
            documents_dir: documents_dir.into(),
            mirror_path: None,
        }
    }

    /// Also write every attempted document to `path` before the remote write.
    #[must_use]
    pub fn with_mirror(mut self, path: Option<PathBuf>) -> Self {
        self.mirror_path = path;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Store path of `node_name`'s document.
    pub fn document_path(&self, node_name: &str) -> String {
        document_path(&self.documents_dir, node_name)
    }

    /// Publish `url` as the current address of `node_name`.
    ///
    /// Reads the document's current version tag and writes with it attached.
    /// A concurrent writer makes this fail with [`PublishError::Conflict`];
    /// no retry happens here.
    pub async fn publish(&self, node_name: &str, url: &str) -> Result<(), PublishError> {
        validate_node_name(node_name)?;
        let path = self.document_path(node_name);
        let body = TunnelRecord::new(node_name, url).to_document()?;

        self.write_mirror(&body).await;

        let handle = self.store.handle(&path).await?;
        let message = format!("Update tunnel URL for {node_name}");
        let written = self.store.update(&handle, &body, &message).await?;

        info!(
            node = %node_name,
            %url,
            path = %path,
            version = ?written.current_version_tag,
            "Published tunnel URL"
        );
        Ok(())
    }

    async fn write_mirror(&self, body: &str) {
        let Some(path) = &self.mirror_path else {
            return;
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty())
            && let Err(e) = tokio::fs::create_dir_all(dir).await
        {
            warn!(path = %dir.display(), error = %e, "Cannot create mirror directory");
            return;
        }
        if let Err(e) = tokio::fs::write(path, body).await {
            warn!(path = %path.display(), error = %e, "Cannot write local mirror");
        }
    }
}
