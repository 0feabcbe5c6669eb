//! In-process content store with the same version-tag semantics as the
//! remote one. Used by tests of the publisher and watcher.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{ContentStore, RemoteDocument, RemoteDocumentHandle};
use crate::error::StoreError;

#[derive(Debug, Default)]
pub struct MemoryContentStore {
    documents: Mutex<HashMap<String, (String, u64)>>,
    next_version: AtomicUsize,
    writes: AtomicUsize,
    failing_writes: AtomicUsize,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful updates so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make the next `n` updates fail with a 503 transport error.
    pub fn fail_next_writes(&self, n: usize) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Body currently stored at `path`.
    pub fn body(&self, path: &str) -> Option<String> {
        self.lock().get(path).map(|(body, _)| body.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, (String, u64)>> {
        self.documents
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn tag(version: u64) -> String {
        format!("v{version}")
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn fetch(&self, path: &str) -> Result<Option<RemoteDocument>, StoreError> {
        Ok(self.lock().get(path).map(|(body, version)| RemoteDocument {
            handle: RemoteDocumentHandle {
                path: path.to_string(),
                current_version_tag: Some(Self::tag(*version)),
            },
            body: body.clone(),
        }))
    }

    async fn update(
        &self,
        handle: &RemoteDocumentHandle,
        body: &str,
        _message: &str,
    ) -> Result<RemoteDocumentHandle, StoreError> {
        let failing = self.failing_writes.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_writes.store(failing - 1, Ordering::SeqCst);
            return Err(StoreError::transport(Some(503), "service unavailable"));
        }

        let mut documents = self.lock();
        let current = documents.get(&handle.path).map(|(_, v)| Self::tag(*v));
        if current != handle.current_version_tag {
            return Err(StoreError::Conflict {
                path: handle.path.clone(),
            });
        }

        let version = self.next_version.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        documents.insert(handle.path.clone(), (body.to_string(), version));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(RemoteDocumentHandle {
            path: handle.path.clone(),
            current_version_tag: Some(Self::tag(version)),
        })
    }

    async fn list_dirs(&self, dir: &str) -> Result<Vec<String>, StoreError> {
        let prefix = format!("{}/", dir.trim_matches('/'));
        let mut names: Vec<String> = self
            .lock()
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter_map(|rest| rest.split_once('/').map(|(name, _)| name.to_string()))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_requires_absent_document() {
        let store = MemoryContentStore::new();
        let new = RemoteDocumentHandle::new_document("servers/a/server.json");
        store.update(&new, "one", "create").await.unwrap();

        let err = store.update(&new, "two", "create again").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.body("servers/a/server.json").as_deref(), Some("one"));
    }

    #[tokio::test]
    async fn stale_tag_is_rejected_without_change() {
        let store = MemoryContentStore::new();
        let path = "servers/a/server.json";
        store
            .update(&RemoteDocumentHandle::new_document(path), "one", "create")
            .await
            .unwrap();

        let stale = store.handle(path).await.unwrap();
        let fresh = store.handle(path).await.unwrap();
        store.update(&fresh, "two", "concurrent").await.unwrap();

        let err = store.update(&stale, "three", "late").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.body(path).as_deref(), Some("two"));
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn list_dirs_returns_node_names() {
        let store = MemoryContentStore::new();
        for node in ["bob", "alice"] {
            let path = format!("servers/{node}/server.json");
            store
                .update(&RemoteDocumentHandle::new_document(path), "{}", "create")
                .await
                .unwrap();
        }
        assert_eq!(store.list_dirs("servers").await.unwrap(), vec!["alice", "bob"]);
        assert!(store.list_dirs("missing").await.unwrap().is_empty());
    }
}
