//! Artifact persistence collaborator
//!
//! Artifacts are stored under a deterministic path derived from their
//! identifier: `<root>/<id>.html`. With the default root this reads
//! `file/<id>.html`.

use crate::error::StoreError;
use crate::types::ArtifactId;
use std::path::{Path, PathBuf};

/// Abstraction over artifact persistence.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Path an artifact with this identifier is (or would be) stored at
    fn path_for(&self, id: &ArtifactId) -> PathBuf;

    /// Persist `bytes` for `id`, returning the storage path.
    async fn store(&self, id: &ArtifactId, bytes: &[u8]) -> Result<PathBuf, StoreError>;
}

/// Filesystem-backed artifact store
#[derive(Clone, Debug)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at `root`. The directory is not created here;
    /// see [`FsArtifactStore::ensure_root`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist yet.
    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create storage directory '{}': {}",
                    self.root.display(),
                    e
                ),
            )
        })
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FsArtifactStore {
    fn path_for(&self, id: &ArtifactId) -> PathBuf {
        self.root.join(format!("{}.html", id))
    }

    async fn store(&self, id: &ArtifactId, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.path_for(id);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })?;

        tracing::debug!(artifact_id = %id, path = %path.display(), bytes = bytes.len(), "Artifact stored");
        Ok(path)
    }
}
