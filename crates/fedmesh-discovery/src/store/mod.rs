//! Versioned remote documents.
//!
//! Every update carries the version tag the caller last observed; the store
//! rejects it with [`StoreError::Conflict`] when the document has moved on.
//! A handle without a tag means "create, and fail if it already exists".

mod github;
#[cfg(any(test, feature = "test-utils"))]
mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;

pub use github::{GitHubContentStore, GitHubStoreConfig};
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryContentStore;

/// Name of the per-node discovery document.
pub const DOCUMENT_NAME: &str = "server.json";

/// Path of a node's discovery document, e.g. `servers/alice/server.json`.
pub fn document_path(documents_dir: &str, node_name: &str) -> String {
    let dir = documents_dir.trim_matches('/');
    if dir.is_empty() {
        format!("{node_name}/{DOCUMENT_NAME}")
    } else {
        format!("{dir}/{node_name}/{DOCUMENT_NAME}")
    }
}

/// A document location plus the version the caller expects it to be at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocumentHandle {
    pub path: String,
    /// Content hash assigned by the store; `None` for a document not yet created.
    pub current_version_tag: Option<String>,
}

impl RemoteDocumentHandle {
    /// Handle for a document that does not exist yet.
    pub fn new_document(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            current_version_tag: None,
        }
    }
}

/// A fetched document and the handle needed to update it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub handle: RemoteDocumentHandle,
    pub body: String,
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch a document; `Ok(None)` when it does not exist.
    async fn fetch(&self, path: &str) -> Result<Option<RemoteDocument>, StoreError>;

    /// Write `body` at `handle.path`, provided the document is still at
    /// `handle.current_version_tag`. Returns the handle for the new version.
    async fn update(
        &self,
        handle: &RemoteDocumentHandle,
        body: &str,
        message: &str,
    ) -> Result<RemoteDocumentHandle, StoreError>;

    /// Names of the immediate sub-directories of `dir`; empty when it does not exist.
    async fn list_dirs(&self, dir: &str) -> Result<Vec<String>, StoreError>;

    /// Current handle for `path`, without the body.
    async fn handle(&self, path: &str) -> Result<RemoteDocumentHandle, StoreError> {
        Ok(self
            .fetch(path)
            .await?
            .map_or_else(|| RemoteDocumentHandle::new_document(path), |doc| doc.handle))
    }
}

#[async_trait]
impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
    async fn fetch(&self, path: &str) -> Result<Option<RemoteDocument>, StoreError> {
        (**self).fetch(path).await
    }

    async fn update(
        &self,
        handle: &RemoteDocumentHandle,
        body: &str,
        message: &str,
    ) -> Result<RemoteDocumentHandle, StoreError> {
        (**self).update(handle, body, message).await
    }

    async fn list_dirs(&self, dir: &str) -> Result<Vec<String>, StoreError> {
        (**self).list_dirs(dir).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_path_is_namespaced_by_node() {
        assert_eq!(document_path("servers", "alice"), "servers/alice/server.json");
        assert_eq!(document_path("/servers/", "bob"), "servers/bob/server.json");
        assert_eq!(document_path("", "carol"), "carol/server.json");
    }
}
