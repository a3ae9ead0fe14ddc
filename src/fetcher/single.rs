//! Single-fetch path.

use crate::error::{FetchError, Result};
use crate::retry;
use crate::types::{ArtifactDescriptor, ArtifactId, FetchRequest};
use std::path::PathBuf;

use super::{ArtifactFetcher, FetchBackend};

impl ArtifactFetcher {
    /// Resolve one request.
    ///
    /// A cache hit returns the cached artifact without touching the network or
    /// the retry budget. On a miss the resource is fetched with up to
    /// `retry_budget` immediate attempts, stored, and cached for
    /// `cache.single_ttl`. A terminal failure leaves the cache untouched.
    ///
    /// # Errors
    ///
    /// - [`FetchError::BudgetExhausted`] when every attempt failed
    /// - [`FetchError::Store`] when the body could not be persisted
    /// - [`crate::Error::ShuttingDown`] after shutdown has begun
    pub async fn fetch_one(&self, request: FetchRequest) -> Result<ArtifactDescriptor> {
        self.ensure_accepting()?;

        if let Some(descriptor) = self.cached_descriptor(&request.uri).await {
            tracing::debug!(uri = %request.uri, artifact_id = %descriptor.artifact_id, "Cache hit");
            return Ok(descriptor);
        }

        let request = self.clamp(request);
        let artifact_id = self.backend.ids.generate();
        let path = fetch_and_store(&self.backend, &request, &artifact_id).await?;

        self.cache
            .update(
                &request.uri,
                artifact_id.clone(),
                self.config.cache.single_ttl,
            )
            .await;

        tracing::info!(uri = %request.uri, artifact_id = %artifact_id, "Artifact fetched");
        Ok(self.backend.descriptor(artifact_id, &request.uri, &path))
    }
}

/// Fetch with the request's budget, then persist under `artifact_id`.
pub(super) async fn fetch_and_store(
    backend: &FetchBackend,
    request: &FetchRequest,
    artifact_id: &ArtifactId,
) -> std::result::Result<PathBuf, FetchError> {
    let body = retry::fetch_with_retry(request.retry_budget, || {
        backend.transport.fetch(&request.uri)
    })
    .await
    .map_err(|exhausted| FetchError::BudgetExhausted {
        uri: request.uri.clone(),
        attempts: exhausted.attempts,
        last_error: exhausted.last_error,
    })?;

    Ok(backend.store.store(artifact_id, &body).await?)
}
