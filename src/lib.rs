//! # artifact-fetcher
//!
//! Fetches remote resources over HTTP, persists them as local artifacts, and
//! serves repeated requests for the same resource from a time-bounded cache.
//!
//! ## Fetch paths
//!
//! - [`ArtifactFetcher::fetch_one`] - one resource, immediate retries within its budget
//! - [`ArtifactFetcher::fetch_batch`] - many resources fetched in parallel rounds,
//!   partitioned into succeeded and failed
//! - [`ArtifactFetcher::fetch_queued`] - one resource through a bounded worker pool
//!
//! All three share one [`ArtifactCache`]. The same operations are exposed over
//! HTTP by the [`api`] module.
//!
//! ## Quick Start
//!
//! ```no_run
//! use artifact_fetcher::{ArtifactFetcher, Config, FetchRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = ArtifactFetcher::new(Config::default()).await?;
//!
//!     let artifact = fetcher
//!         .fetch_one(FetchRequest::new("https://example.com/", 3))
//!         .await?;
//!     println!("{} stored at {}", artifact.source_uri, artifact.storage_path);
//!
//!     fetcher.shutdown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Time-expiring artifact cache
pub mod cache;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Core fetch implementation (decomposed into focused submodules)
pub mod fetcher;
/// Retry budget accounting
pub mod retry;
/// Artifact persistence
pub mod storage;
/// Network fetch
pub mod transport;
/// Core wire and domain types
pub mod types;

// Re-export commonly used types
pub use cache::ArtifactCache;
pub use config::Config;
pub use error::{
    ApiError, Error, ErrorDetail, FetchError, Result, StoreError, ToHttpStatus, TransportError,
};
pub use fetcher::{ArtifactFetcher, FetchBackend};
pub use storage::{ArtifactStore, FsArtifactStore};
pub use transport::{HttpTransport, Transport};
pub use types::{
    ArtifactDescriptor, ArtifactId, BatchRequest, BatchResult, CacheEntry, FetchOutcome,
    FetchRequest, IdGenerator, UuidGenerator,
};

/// Helper function to run the fetcher with graceful signal handling.
///
/// Waits for a termination signal and then calls the fetcher's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(fetcher: ArtifactFetcher) -> Result<()> {
    wait_for_signal().await;
    fetcher.shutdown().await
}

/// Serve the REST API until a termination signal arrives, then shut down.
///
/// The listener stops accepting connections on SIGTERM/SIGINT, in-flight
/// requests finish, and the fetcher's workers and cache sweep are stopped.
///
/// # Example
///
/// ```no_run
/// use artifact_fetcher::{ArtifactFetcher, Config, run_server};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let fetcher = ArtifactFetcher::new(Config::default()).await?;
///     run_server(fetcher).await?;
///     Ok(())
/// }
/// ```
pub async fn run_server(fetcher: ArtifactFetcher) -> Result<()> {
    let config = std::sync::Arc::new(fetcher.config().clone());
    let fetcher = std::sync::Arc::new(fetcher);

    let served =
        api::start_api_server_with_shutdown(fetcher.clone(), config, wait_for_signal()).await;

    // Stop background work even if the listener failed
    let stopped = fetcher.shutdown().await;
    served.and(stopped)
}

/// Resolves once the process is asked to stop.
async fn wait_for_signal() {
    let received = first_stop_request(terminate_signal(), interrupt_signal()).await;
    tracing::info!(signal = received, "Stop requested");
}

/// Races the two stop sources and names the one that fired.
async fn first_stop_request(
    terminate: impl std::future::Future<Output = ()>,
    interrupt: impl std::future::Future<Output = ()>,
) -> &'static str {
    tokio::select! {
        _ = terminate => "terminate",
        _ = interrupt => "interrupt",
    }
}

// A source that cannot be registered never resolves, so the other one still can.
#[cfg(unix)]
async fn terminate_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable, stopping on Ctrl+C only");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await;
}

async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Ctrl+C handler unavailable");
        std::future::pending::<()>().await;
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_first_stop_request_names_terminate() {
        let received = first_stop_request(async {}, std::future::pending::<()>()).await;
        assert_eq!(received, "terminate");
    }

    #[tokio::test]
    async fn test_first_stop_request_names_interrupt() {
        let received = first_stop_request(
            tokio::time::sleep(Duration::from_secs(60)),
            tokio::time::sleep(Duration::from_millis(10)),
        )
        .await;
        assert_eq!(received, "interrupt");
    }

    #[tokio::test]
    async fn test_unavailable_source_does_not_stop_the_wait() {
        let waited = tokio::time::timeout(
            Duration::from_millis(50),
            first_stop_request(std::future::pending::<()>(), std::future::pending::<()>()),
        )
        .await;
        assert!(waited.is_err());
    }
}
