//! Test configuration helpers for creating fetchers over the real HTTP stack

use artifact_fetcher::{ArtifactFetcher, Config};
use std::time::Duration;
use tempfile::TempDir;

/// Configuration with storage inside `temp_dir` and short timeouts.
pub fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.fetch.storage_dir = temp_dir.path().join("file");
    config.fetch.request_timeout = Duration::from_secs(5);
    config.worker.workers = 2;
    config.worker.queue_capacity = 8;
    config.worker.wait_timeout = Duration::from_secs(10);
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    config
}

/// Fetcher using `HttpTransport` and a filesystem store in a fresh temp dir.
///
/// Returns the fetcher and the tempdir (which must be kept alive).
pub async fn create_http_fetcher() -> (ArtifactFetcher, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let fetcher = ArtifactFetcher::new(test_config(&temp_dir)).await.unwrap();
    (fetcher, temp_dir)
}
