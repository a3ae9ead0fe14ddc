//! Shared test helpers for creating ArtifactFetcher instances in tests.

use crate::config::Config;
use crate::error::{StoreError, TransportError};
use crate::fetcher::{ArtifactFetcher, FetchBackend};
use crate::storage::{ArtifactStore, FsArtifactStore};
use crate::transport::Transport;
use crate::types::{ArtifactId, IdGenerator};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

/// Transport whose behaviour is scripted per URI.
///
/// A URI fails its first `n` fetches (see [`ScriptedTransport::fail_times`]) and
/// succeeds afterwards with the body `body of <uri>`. URIs without a script
/// succeed immediately unless the transport was built with
/// [`ScriptedTransport::always_failing`].
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    failures: HashMap<String, u32>,
    fail_by_default: bool,
    invalid: Vec<String>,
    delay: Option<Duration>,
    calls: Mutex<HashMap<String, u32>>,
}

impl ScriptedTransport {
    pub(crate) fn always_ok() -> Self {
        Self::default()
    }

    pub(crate) fn always_failing() -> Self {
        Self {
            fail_by_default: true,
            ..Self::default()
        }
    }

    /// Fail the first `n` fetches of `uri`, then succeed.
    pub(crate) fn fail_times(mut self, uri: &str, n: u32) -> Self {
        self.failures.insert(uri.to_string(), n);
        self
    }

    /// Always fail `uri` with a non-retryable error.
    pub(crate) fn invalid(mut self, uri: &str) -> Self {
        self.invalid.push(uri.to_string());
        self
    }

    /// Sleep before answering every fetch.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches made for `uri`.
    pub(crate) fn calls(&self, uri: &str) -> u32 {
        self.calls.lock().unwrap().get(uri).copied().unwrap_or(0)
    }

    /// Number of fetches made for any URI.
    pub(crate) fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, TransportError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(uri.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.invalid.iter().any(|u| u == uri) {
            return Err(TransportError::InvalidUri {
                uri: uri.to_string(),
                reason: "scripted".to_string(),
            });
        }

        let fails = match self.failures.get(uri) {
            Some(n) => call <= *n,
            None => self.fail_by_default,
        };
        if fails {
            return Err(TransportError::Status {
                uri: uri.to_string(),
                status: 503,
            });
        }

        Ok(format!("body of {uri}").into_bytes())
    }
}

/// Store that rejects every write.
pub(crate) struct FailingStore;

#[async_trait::async_trait]
impl ArtifactStore for FailingStore {
    fn path_for(&self, id: &ArtifactId) -> PathBuf {
        PathBuf::from("unwritable").join(format!("{id}.html"))
    }

    async fn store(&self, id: &ArtifactId, _bytes: &[u8]) -> Result<PathBuf, StoreError> {
        Err(StoreError::Write {
            path: self.path_for(id),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

/// Predictable identifiers: `artifact-1`, `artifact-2`, ...
#[derive(Default)]
pub(crate) struct SequentialIds(AtomicU64);

impl IdGenerator for SequentialIds {
    fn generate(&self) -> ArtifactId {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        ArtifactId(format!("artifact-{n}"))
    }
}

/// Test configuration rooted in `dir`.
pub(crate) fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.fetch.storage_dir = dir.join("file");
    config.worker.workers = 2;
    config.worker.queue_capacity = 16;
    config.worker.wait_timeout = Duration::from_secs(5);
    config
}

/// Helper to create a test ArtifactFetcher over `transport` with a real
/// filesystem store. Returns the fetcher and the tempdir (which must be kept alive).
pub(crate) async fn create_test_fetcher(
    transport: Arc<ScriptedTransport>,
) -> (ArtifactFetcher, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(temp_dir.path());
    let fetcher = create_test_fetcher_with(config, transport).await;
    (fetcher, temp_dir)
}

/// Like [`create_test_fetcher`] but with a caller-built configuration.
pub(crate) async fn create_test_fetcher_with(
    config: Config,
    transport: Arc<ScriptedTransport>,
) -> ArtifactFetcher {
    let store = FsArtifactStore::new(&config.fetch.storage_dir);
    store.ensure_root().await.unwrap();

    let backend = FetchBackend {
        transport,
        store: Arc::new(store),
        ids: Arc::new(SequentialIds::default()),
    };
    ArtifactFetcher::with_backend(config, backend).unwrap()
}
