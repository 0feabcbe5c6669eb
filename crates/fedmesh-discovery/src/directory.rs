//! Read side of the shared directory: every node's published record.

use fedmesh_core::TunnelRecord;
use tracing::warn;

use crate::error::StoreError;
use crate::store::{ContentStore, document_path};

/// Reads published [`TunnelRecord`]s from a [`ContentStore`].
pub struct Directory<'a, S: ?Sized> {
    store: &'a S,
    documents_dir: &'a str,
}

impl<'a, S: ContentStore + ?Sized> Directory<'a, S> {
    pub const fn new(store: &'a S, documents_dir: &'a str) -> Self {
        Self {
            store,
            documents_dir,
        }
    }

    /// The record published for `node_name`, if any.
    pub async fn record(&self, node_name: &str) -> Result<Option<TunnelRecord>, StoreError> {
        let path = document_path(self.documents_dir, node_name);
        let Some(doc) = self.store.fetch(&path).await? else {
            return Ok(None);
        };
        TunnelRecord::from_document(&doc.body)
            .map(Some)
            .map_err(|e| StoreError::Decode(format!("{path}: {e}")))
    }

    /// All parseable records, sorted by node name.
    ///
    /// A node directory without a readable record is skipped with a warning.
    pub async fn records(&self) -> Result<Vec<TunnelRecord>, StoreError> {
        let mut records = Vec::new();
        for node in self.store.list_dirs(self.documents_dir).await? {
            match self.record(&node).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => warn!(node = %node, "Node directory has no server.json"),
                Err(StoreError::Decode(msg)) => warn!(node = %node, "Skipping record: {msg}"),
                Err(e) => return Err(e),
            }
        }
        records.sort_by(|a, b| a.node_name.cmp(&b.node_name));
        Ok(records)
    }
}
