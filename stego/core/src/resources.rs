//! Resource Handles
//!
//! Encoded images come back from the service as raw bytes. The session never
//! holds those bytes directly: they are registered in a [`ResourceStore`] and
//! the outcome carries a [`ResourceHandle`], a small addressable reference that
//! can be displayed, saved, or revoked.
//!
//! Handles must be revoked once the outcome that owns them is superseded or
//! the session ends, otherwise the bytes stay alive for the rest of the process.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors from resource lookups and saves
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The handle was revoked (or never belonged to this store)
    #[error("Resource {0} has been revoked")]
    Revoked(ResourceId),

    /// Writing the resource to disk failed
    #[error("Failed to save resource to {path}: {source}")]
    Save {
        /// Destination path
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },
}

/// Unique resource identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceId(Uuid);

impl ResourceId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Locally addressable reference to binary data held by a [`ResourceStore`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHandle {
    /// Identifier within the store
    pub id: ResourceId,
    /// MIME type of the content
    pub content_type: String,
    /// Suggested file name for downloads
    pub file_name: String,
    /// Content length in bytes
    pub len: usize,
}

impl ResourceHandle {
    /// Address of this resource, e.g. `blob:stego/6f1c...`
    #[must_use]
    pub fn url(&self) -> String {
        format!("blob:stego/{}", self.id)
    }
}

#[derive(Debug)]
struct StoredResource {
    bytes: Arc<[u8]>,
}

/// Registry of live binary resources
///
/// Shared between the orchestrator (which creates and revokes handles) and
/// surfaces (which read or save them).
#[derive(Debug, Default)]
pub struct ResourceStore {
    entries: Mutex<HashMap<ResourceId, StoredResource>>,
}

impl ResourceStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes and return a handle to them
    pub fn create(
        &self,
        bytes: impl Into<Arc<[u8]>>,
        content_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> ResourceHandle {
        let bytes = bytes.into();
        let handle = ResourceHandle {
            id: ResourceId::new(),
            content_type: content_type.into(),
            file_name: file_name.into(),
            len: bytes.len(),
        };
        self.entries
            .lock()
            .insert(handle.id, StoredResource { bytes });
        tracing::debug!(resource = %handle.id, len = handle.len, "Resource created");
        handle
    }

    /// Content behind a handle, if it is still live
    #[must_use]
    pub fn bytes(&self, handle: &ResourceHandle) -> Option<Arc<[u8]>> {
        self.entries
            .lock()
            .get(&handle.id)
            .map(|entry| Arc::clone(&entry.bytes))
    }

    /// Whether a handle is still live
    #[must_use]
    pub fn contains(&self, handle: &ResourceHandle) -> bool {
        self.entries.lock().contains_key(&handle.id)
    }

    /// Release a handle. Returns false if it was already revoked.
    pub fn revoke(&self, handle: &ResourceHandle) -> bool {
        let removed = self.entries.lock().remove(&handle.id).is_some();
        if removed {
            tracing::debug!(resource = %handle.id, "Resource revoked");
        }
        removed
    }

    /// Release every live handle, returning how many were released
    pub fn revoke_all(&self) -> usize {
        let mut entries = self.entries.lock();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Number of live handles
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries.lock().len()
    }

    /// Write a resource to `path`
    ///
    /// # Errors
    ///
    /// Fails if the handle is revoked or the file cannot be written.
    pub async fn save(&self, handle: &ResourceHandle, path: &Path) -> Result<(), ResourceError> {
        let bytes = self
            .bytes(handle)
            .ok_or(ResourceError::Revoked(handle.id))?;
        tokio::fs::write(path, &bytes[..])
            .await
            .map_err(|source| ResourceError::Save {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(resource = %handle.id, path = %path.display(), "Resource saved");
        Ok(())
    }

    /// Write a resource into `dir` under its suggested file name
    ///
    /// # Errors
    ///
    /// Same as [`ResourceStore::save`].
    pub async fn save_into_dir(
        &self,
        handle: &ResourceHandle,
        dir: &Path,
    ) -> Result<PathBuf, ResourceError> {
        let path = dir.join(&handle.file_name);
        self.save(handle, &path).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_read() {
        let store = ResourceStore::new();
        let handle = store.create(vec![1u8, 2, 3], "image/png", "encoded_image.png");

        assert_eq!(handle.len, 3);
        assert!(handle.url().starts_with("blob:stego/"));
        assert_eq!(store.bytes(&handle).as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(store.live_count(), 1);
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let store = ResourceStore::new();
        let handle = store.create(vec![9u8], "image/png", "a.png");

        assert!(store.revoke(&handle));
        assert!(!store.revoke(&handle));
        assert!(store.bytes(&handle).is_none());
        assert!(!store.contains(&handle));
    }

    #[test]
    fn test_revoke_all() {
        let store = ResourceStore::new();
        store.create(vec![1u8], "image/png", "a.png");
        store.create(vec![2u8], "image/png", "b.png");

        assert_eq!(store.revoke_all(), 2);
        assert_eq!(store.live_count(), 0);
    }

    #[tokio::test]
    async fn test_save_into_dir_uses_suggested_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResourceStore::new();
        let handle = store.create(b"PNGDATA".to_vec(), "image/png", "encoded_image.png");

        let path = store.save_into_dir(&handle, dir.path()).await.unwrap();
        assert_eq!(path, dir.path().join("encoded_image.png"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"PNGDATA");
    }

    #[tokio::test]
    async fn test_save_revoked_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResourceStore::new();
        let handle = store.create(vec![1u8], "image/png", "x.png");
        store.revoke(&handle);

        let err = store
            .save(&handle, &dir.path().join("x.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::Revoked(id) if id == handle.id));
    }
}
