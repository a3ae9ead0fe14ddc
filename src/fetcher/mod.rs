//! Core fetch implementation split into focused submodules.
//!
//! The `ArtifactFetcher` struct and its methods are organized by path:
//! - [`single`] - Single-fetch path (cache lookup, fetch-with-retry, store)
//! - [`batch`] - Batch orchestrator (cache partition, parallel rounds, outcome collection)
//! - [`task`] - Per-item fetch task run once per request per round
//! - [`worker`] - Background worker pool behind queued fetches
//! - [`lifecycle`] - Shutdown coordination

mod batch;
mod lifecycle;
mod single;
mod task;
mod worker;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::cache::ArtifactCache;
use crate::config::{Config, FetchConfig};
use crate::error::{Error, Result};
use crate::retry;
use crate::storage::{ArtifactStore, FsArtifactStore};
use crate::transport::{HttpTransport, Transport};
use crate::types::{ArtifactDescriptor, ArtifactId, FetchRequest, IdGenerator, UuidGenerator};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// External collaborators the fetch core delegates to
///
/// Injected at construction so callers (and tests) can swap the network,
/// the artifact storage, or identifier generation.
#[derive(Clone)]
pub struct FetchBackend {
    /// Network fetch
    pub transport: Arc<dyn Transport>,
    /// Artifact persistence
    pub store: Arc<dyn ArtifactStore>,
    /// Artifact identifier generation
    pub ids: Arc<dyn IdGenerator>,
}

impl FetchBackend {
    /// HTTP transport, filesystem store rooted at `storage_dir`, UUID identifiers.
    pub fn http(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            transport: Arc::new(HttpTransport::new(config)?),
            store: Arc::new(FsArtifactStore::new(&config.storage_dir)),
            ids: Arc::new(UuidGenerator),
        })
    }

    pub(crate) fn descriptor(
        &self,
        artifact_id: ArtifactId,
        source_uri: &str,
        storage_path: &Path,
    ) -> ArtifactDescriptor {
        ArtifactDescriptor {
            artifact_id,
            source_uri: source_uri.to_string(),
            storage_path: storage_path.display().to_string(),
        }
    }
}

/// Main fetcher instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ArtifactFetcher {
    pub(crate) config: Arc<Config>,
    pub(crate) cache: ArtifactCache,
    pub(crate) backend: FetchBackend,
    pub(crate) workers: Arc<worker::WorkerPool>,
    /// Cleared during shutdown; new fetches are refused afterwards
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl ArtifactFetcher {
    /// Create a fetcher with the HTTP backend.
    ///
    /// Validates the configuration, creates the storage directory, starts the
    /// cache sweep and the worker pool.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let store = FsArtifactStore::new(&config.fetch.storage_dir);
        store.ensure_root().await?;

        let backend = FetchBackend {
            store: Arc::new(store),
            ..FetchBackend::http(&config.fetch)?
        };
        Self::with_backend(config, backend)
    }

    /// Create a fetcher around caller-supplied collaborators.
    ///
    /// Must be called from within a Tokio runtime (background tasks are spawned).
    pub fn with_backend(config: Config, backend: FetchBackend) -> Result<Self> {
        config.validate()?;

        let cache = ArtifactCache::new(&config.cache);
        let workers = worker::WorkerPool::spawn(&config.worker, backend.clone());

        tracing::info!(
            storage_dir = %config.fetch.storage_dir.display(),
            workers = config.worker.workers,
            sweep_interval_secs = config.cache.sweep_interval.as_secs(),
            "Artifact fetcher started"
        );

        Ok(Self {
            config: Arc::new(config),
            cache,
            backend,
            workers: Arc::new(workers),
            accepting_new: Arc::new(AtomicBool::new(true)),
        })
    }

    /// The artifact cache shared by every fetch path
    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether new fetches are accepted (false once shutdown has begun)
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_accepting(&self) -> Result<()> {
        if self.is_accepting() {
            Ok(())
        } else {
            Err(Error::ShuttingDown)
        }
    }

    /// Apply the configured budget ceiling.
    pub(crate) fn clamp(&self, mut request: FetchRequest) -> FetchRequest {
        request.retry_budget =
            retry::clamp_budget(request.retry_budget, self.config.fetch.max_retry_budget);
        request
    }

    /// Descriptor for a cache hit, if any.
    pub(crate) async fn cached_descriptor(&self, source_uri: &str) -> Option<ArtifactDescriptor> {
        let entry = self.cache.read(source_uri).await?;
        let path = self.backend.store.path_for(&entry.artifact_id);
        Some(
            self.backend
                .descriptor(entry.artifact_id, &entry.source_uri, &path),
        )
    }
}
