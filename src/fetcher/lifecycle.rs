//! Shutdown coordination.

use crate::error::Result;
use std::time::Duration;

use super::ArtifactFetcher;

/// Upper bound on waiting for in-flight worker fetches during shutdown
const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

impl ArtifactFetcher {
    /// Gracefully shut down the fetcher
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new fetches (all entry points return `ShuttingDown`)
    /// 2. Stops the worker pool, letting in-flight fetches finish (bounded by a timeout)
    /// 3. Stops the cache sweep and waits for it to exit
    ///
    /// Batches already running are not interrupted. Calling `shutdown` more than
    /// once is harmless.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new fetches");

        match tokio::time::timeout(WORKER_DRAIN_TIMEOUT, self.workers.shutdown()).await {
            Ok(()) => tracing::info!("Worker pool stopped"),
            Err(_) => tracing::warn!(
                timeout_secs = WORKER_DRAIN_TIMEOUT.as_secs(),
                "Timeout waiting for workers to finish, proceeding with shutdown"
            ),
        }

        self.cache.shutdown().await;

        tracing::info!("Shutdown complete");
        Ok(())
    }
}
