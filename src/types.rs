//! Core types for artifact-fetcher

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque identifier of a locally stored artifact
///
/// Generated once per cache miss and used to derive the artifact's storage path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ArtifactId(pub String);

impl ArtifactId {
    /// Create a new ArtifactId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ArtifactId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ArtifactId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request to fetch one remote resource
///
/// `retry_budget` is the number of remaining fetch attempts. It is clamped to the
/// configured maximum before any work starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FetchRequest {
    /// Source URI of the resource
    pub uri: String,

    /// Remaining fetch attempts (default: 0, which still allows a single attempt)
    #[serde(default, rename = "retryLimit", alias = "retryBudget")]
    pub retry_budget: u32,
}

impl FetchRequest {
    /// Create a new request
    pub fn new(uri: impl Into<String>, retry_budget: u32) -> Self {
        Self {
            uri: uri.into(),
            retry_budget,
        }
    }

    /// Account for one fetch attempt.
    pub fn consume_attempt(&mut self) {
        self.retry_budget = self.retry_budget.saturating_sub(1);
    }
}

/// Where a fetched artifact lives
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ArtifactDescriptor {
    /// Locally generated artifact identifier
    #[serde(rename = "id")]
    pub artifact_id: ArtifactId,

    /// Source URI the artifact was fetched from
    #[serde(rename = "uri")]
    pub source_uri: String,

    /// Storage path of the artifact (e.g. `file/<id>.html`)
    #[serde(rename = "sourceUri")]
    pub storage_path: String,
}

/// Request body for a batch fetch
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct BatchRequest {
    /// Requests to resolve (duplicates are fetched independently)
    #[serde(default)]
    pub urls: Vec<FetchRequest>,
}

/// Result of a batch fetch, partitioned by outcome
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchResult {
    /// Artifacts that were cached or fetched successfully
    #[serde(rename = "urls", default)]
    pub succeeded: Vec<ArtifactDescriptor>,

    /// Requests that exhausted their budget, carrying the remaining budget
    #[serde(default)]
    pub failed: Vec<FetchRequest>,
}

impl BatchResult {
    /// Total number of requests accounted for
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// True when no request was accounted for
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Metadata about a previously fetched artifact, keyed by source URI
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Source URI (cache key)
    pub source_uri: String,
    /// Identifier of the stored artifact
    pub artifact_id: ArtifactId,
    /// Unix timestamp (seconds) at which the entry expires
    pub expires_at: i64,
}

/// Outcome of a single per-item fetch attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fetched and stored
    Success(ArtifactDescriptor),
    /// Transport failed, budget remains
    Retry(FetchRequest),
    /// Budget exhausted, non-retryable transport error, or storage failure
    Failed(FetchRequest),
}

/// Generates unique artifact identifiers
pub trait IdGenerator: Send + Sync {
    /// Produce a fresh identifier
    fn generate(&self) -> ArtifactId;
}

/// Random UUID v4 identifiers
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> ArtifactId {
        ArtifactId(uuid::Uuid::new_v4().to_string())
    }
}
