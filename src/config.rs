//! Configuration types for artifact-fetcher

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};

/// Artifact cache settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Interval between expiry sweeps in seconds (default: 30)
    ///
    /// Keep this at or below the shortest TTL; otherwise an expired entry can
    /// keep being served for up to one interval past its expiry.
    #[serde(default = "default_sweep_interval", with = "duration_serde")]
    pub sweep_interval: Duration,

    /// TTL of entries written by the single-fetch and queued paths (default: 24 hours)
    #[serde(default = "default_single_ttl", with = "duration_serde")]
    pub single_ttl: Duration,

    /// TTL of entries written by the batch path (default: 60 seconds)
    #[serde(default = "default_batch_ttl", with = "duration_serde")]
    pub batch_ttl: Duration,

    /// Hide expired entries on read instead of relying on the sweep alone (default: false)
    #[serde(default)]
    pub enforce_ttl_on_read: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval: default_sweep_interval(),
            single_ttl: default_single_ttl(),
            batch_ttl: default_batch_ttl(),
            enforce_ttl_on_read: false,
        }
    }
}

/// Transport and storage settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Directory artifacts are written to (default: "file")
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Upper bound applied to every request's retry budget (default: 10)
    #[serde(default = "default_max_retry_budget")]
    pub max_retry_budget: u32,

    /// Per-request HTTP timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every fetch
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            max_retry_budget: default_max_retry_budget(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Background worker pool used by queued fetches
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of worker tasks (default: 10)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Maximum number of queued jobs (default: 10000)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How long a caller waits for its queued job, in seconds (default: 120)
    #[serde(default = "default_wait_timeout", with = "duration_serde")]
    pub wait_timeout: Duration,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            wait_timeout: default_wait_timeout(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:9090)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// External access settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Main configuration for ArtifactFetcher
///
/// Every field has a default, so `{}` is a valid configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Artifact cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Transport and storage settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Worker pool for queued fetches
    #[serde(default)]
    pub worker: WorkerPoolConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Load a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read config file '{}': {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse config file '{}': {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would make the fetcher unusable.
    ///
    /// A sweep interval longer than the shortest TTL is allowed but logged.
    pub fn validate(&self) -> Result<()> {
        if self.cache.sweep_interval.is_zero() {
            return Err(Error::Config {
                message: "sweep interval must be greater than zero".into(),
                key: Some("cache.sweep_interval".into()),
            });
        }
        if self.worker.workers == 0 {
            return Err(Error::Config {
                message: "at least one worker is required".into(),
                key: Some("worker.workers".into()),
            });
        }
        if self.worker.queue_capacity == 0 {
            return Err(Error::Config {
                message: "queue capacity must be greater than zero".into(),
                key: Some("worker.queue_capacity".into()),
            });
        }

        let shortest_ttl = self.cache.single_ttl.min(self.cache.batch_ttl);
        if self.cache.sweep_interval > shortest_ttl {
            tracing::warn!(
                sweep_interval_secs = self.cache.sweep_interval.as_secs(),
                shortest_ttl_secs = shortest_ttl.as_secs(),
                "Sweep interval exceeds the shortest cache TTL; expired entries may be served until the next sweep"
            );
        }

        Ok(())
    }
}

// Default value functions
fn default_sweep_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_single_ttl() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_batch_ttl() -> Duration {
    Duration::from_secs(60)
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("file")
}

fn default_max_retry_budget() -> u32 {
    crate::retry::MAX_RETRY_BUDGET
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("artifact-fetcher/{}", env!("CARGO_PKG_VERSION"))
}

fn default_workers() -> usize {
    10
}

fn default_queue_capacity() -> usize {
    10_000
}

fn default_wait_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9090))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
