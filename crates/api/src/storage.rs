//! Storage for uploaded listing images.
//!
//! Images are addressed by an object path inside a bucket and served at
//! `{public_base_url}/{bucket}/{object_path}`. [`LocalImageStore`] keeps
//! them on the local filesystem, one directory per bucket.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use goldipuppy_core::storage::{object_path_from_url, public_url};

use crate::config::StorageConfig;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),
}

/// A place to put and remove listing images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `bytes` at `object_path` and return the public URL.
    async fn put(&self, object_path: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Remove an object. Removing a missing object is not an error.
    async fn delete(&self, object_path: &str) -> Result<(), StorageError>;

    /// Object path of a public URL, if it points into this store.
    fn object_path(&self, url: &str) -> Option<String>;
}

/// Filesystem-backed [`ImageStore`].
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    public_base_url: String,
    bucket: String,
}

impl LocalImageStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
            public_base_url: config.public_base_url.clone(),
            bucket: config.bucket.clone(),
        }
    }

    /// Directory served at the public base URL.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, object_path: &str) -> Result<PathBuf, StorageError> {
        let safe = !object_path.is_empty()
            && !object_path.starts_with('/')
            && object_path
                .split('/')
                .all(|seg| !seg.is_empty() && seg != "." && seg != "..");
        if !safe {
            return Err(StorageError::InvalidPath(object_path.to_string()));
        }
        Ok(self.root.join(&self.bucket).join(object_path))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, object_path: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let path = self.file_path(object_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(public_url(&self.public_base_url, &self.bucket, object_path))
    }

    async fn delete(&self, object_path: &str) -> Result<(), StorageError> {
        let path = self.file_path(object_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn object_path(&self, url: &str) -> Option<String> {
        object_path_from_url(url, &self.bucket)
    }
}

/// Delete the stored files behind `urls`, logging and swallowing failures.
///
/// URLs that do not point into the store (external hosts, other buckets)
/// are skipped. Returns the number of objects removed.
pub async fn delete_images_best_effort(store: &dyn ImageStore, urls: &[String]) -> usize {
    let mut removed = 0;
    for url in urls {
        let Some(object_path) = store.object_path(url) else {
            tracing::debug!(url = %url, "Image not in storage bucket, skipping");
            continue;
        };
        match store.delete(&object_path).await {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(object_path = %object_path, error = %e, "Failed to delete stored image");
            }
        }
    }
    removed
}
