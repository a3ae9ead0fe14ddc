//! Time-expiring artifact cache
//!
//! Maps a source URI to the artifact previously fetched from it. Entries carry
//! an absolute expiry (Unix seconds) and are removed by a background sweep that
//! runs on its own interval, independent of any entry's TTL.
//!
//! Reads take the shared lock and by default do not look at expiry: an expired
//! entry stays visible until the next sweep removes it. Setting
//! [`CacheConfig::enforce_ttl_on_read`] hides expired entries immediately.
//!
//! The cache is an explicitly constructed handle. Clones share the same map;
//! [`ArtifactCache::shutdown`] stops the sweep and waits for it to exit.

use crate::config::CacheConfig;
use crate::types::{ArtifactId, CacheEntry};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type EntryMap = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// Shared handle to the artifact cache (cheap to clone)
#[derive(Clone)]
pub struct ArtifactCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    entries: EntryMap,
    enforce_ttl_on_read: bool,
    stop: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for CacheInner {
    fn drop(&mut self) {
        // Last handle gone without an explicit shutdown; let the sweep exit on its own.
        self.stop.cancel();
    }
}

impl ArtifactCache {
    /// Create the cache and start its expiry sweep.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: &CacheConfig) -> Self {
        let entries: EntryMap = Arc::new(RwLock::new(HashMap::new()));
        let stop = CancellationToken::new();
        let sweeper = spawn_sweeper(entries.clone(), config.sweep_interval, stop.clone());

        Self {
            inner: Arc::new(CacheInner {
                entries,
                enforce_ttl_on_read: config.enforce_ttl_on_read,
                stop,
                sweeper: Mutex::new(Some(sweeper)),
            }),
        }
    }

    /// Insert or replace the entry for `source_uri`, expiring `ttl` from now.
    pub async fn update(&self, source_uri: &str, artifact_id: ArtifactId, ttl: Duration) {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires_at = now_epoch_secs().saturating_add(ttl_secs);
        let entry = CacheEntry {
            source_uri: source_uri.to_string(),
            artifact_id,
            expires_at,
        };

        let mut entries = self.inner.entries.write().await;
        entries.insert(source_uri.to_string(), entry);
        tracing::debug!(uri = source_uri, expires_at, "Cache entry updated");
    }

    /// Look up the entry for `source_uri`.
    pub async fn read(&self, source_uri: &str) -> Option<CacheEntry> {
        let entries = self.inner.entries.read().await;
        let entry = entries.get(source_uri)?;

        if self.inner.enforce_ttl_on_read && entry.expires_at <= now_epoch_secs() {
            return None;
        }
        Some(entry.clone())
    }

    /// Remove every entry that has expired by now. Returns the number removed.
    pub async fn sweep_expired(&self) -> usize {
        sweep(&self.inner.entries, now_epoch_secs()).await
    }

    /// Number of stored entries, including expired ones not yet swept
    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    /// True when no entries are stored
    pub async fn is_empty(&self) -> bool {
        self.inner.entries.read().await.is_empty()
    }

    /// Stop the background sweep and wait until it has exited.
    ///
    /// Safe to call more than once; later calls return immediately.
    pub async fn shutdown(&self) {
        self.inner.stop.cancel();

        let handle = self.inner.sweeper.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Cache sweep task ended abnormally");
            }
            tracing::debug!("Cache sweep stopped");
        }
    }
}

fn spawn_sweeper(
    entries: EntryMap,
    interval: Duration,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // tokio::time::interval panics on a zero period
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = sweep(&entries, now_epoch_secs()).await;
                    if removed > 0 {
                        tracing::debug!(removed, "Swept expired cache entries");
                    }
                }
            }
        }
    })
}

/// One pass under the exclusive lock.
async fn sweep(entries: &EntryMap, now: i64) -> usize {
    let mut entries = entries.write().await;
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);
    before - entries.len()
}

fn now_epoch_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
