//! Error types for artifact-fetcher
//!
//! This module provides error handling for the library, including:
//! - Collaborator errors (transport, storage) with URI/path context
//! - Terminal fetch errors surfaced to callers of the single-fetch and queued paths
//! - HTTP status code mapping and structured JSON error bodies for the API
//!
//! A cache miss is not an error: lookups return `Option`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for artifact-fetcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for artifact-fetcher
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "cache.sweep_interval")
        key: Option<String>,
    },

    /// Terminal fetch failure (budget exhausted or artifact not persisted)
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Malformed caller input
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction or protocol error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new fetches
    #[error("shutdown in progress: not accepting new fetches")]
    ShuttingDown,

    /// Worker queue is at capacity
    #[error("worker queue is full ({capacity} pending jobs)")]
    QueueFull {
        /// Configured queue capacity
        capacity: usize,
    },

    /// A queued fetch did not finish within the caller's wait window
    #[error("queued fetch of {uri} did not finish within {waited_secs}s")]
    WorkerTimeout {
        /// Source URI of the queued request
        uri: String,
        /// Seconds the caller waited
        waited_secs: u64,
    },
}

/// Failure of the abstract `fetch(uri)` collaborator
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// URI cannot be requested at all (bad syntax, unsupported scheme)
    #[error("invalid URI {uri}: {reason}")]
    InvalidUri {
        /// The rejected URI
        uri: String,
        /// Why it was rejected
        reason: String,
    },

    /// Connection or protocol failure while issuing the request
    #[error("request to {uri} failed: {message}")]
    Request {
        /// Requested URI
        uri: String,
        /// Underlying client message
        message: String,
    },

    /// Request exceeded the configured timeout
    #[error("request to {uri} timed out")]
    Timeout {
        /// Requested URI
        uri: String,
    },

    /// Server answered with a non-success status
    #[error("request to {uri} returned HTTP {status}")]
    Status {
        /// Requested URI
        uri: String,
        /// HTTP status code
        status: u16,
    },

    /// Response body could not be read
    #[error("failed to read body from {uri}: {message}")]
    Body {
        /// Requested URI
        uri: String,
        /// Underlying client message
        message: String,
    },
}

/// Failure of the abstract `store(id, bytes)` collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    /// Writing the artifact file failed
    #[error("failed to write artifact {path}: {source}")]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Terminal failures of a fetch-with-retry
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every allowed attempt failed (or a non-retryable error stopped the attempts)
    #[error("failed to fetch {uri} after {attempts} attempt(s): {last_error}")]
    BudgetExhausted {
        /// Source URI
        uri: String,
        /// Number of transport attempts made
        attempts: u32,
        /// Error of the final attempt
        last_error: TransportError,
    },

    /// The resource was fetched but could not be persisted
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "fetch_failed",
///     "message": "fetch error: failed to fetch http://a after 3 attempt(s): ...",
///     "details": { "uri": "http://a", "attempts": 3 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "fetch_failed", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            Error::Config { .. } => 400,
            Error::InvalidRequest(_) => 400,

            // Upstream resource could not be fetched
            Error::Fetch(FetchError::BudgetExhausted { .. }) => 502,
            Error::Network(_) => 502,

            Error::Fetch(FetchError::Store(_)) => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            Error::ShuttingDown => 503,
            Error::QueueFull { .. } => 503,
            Error::WorkerTimeout { .. } => 504,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Fetch(FetchError::BudgetExhausted { .. }) => "fetch_failed",
            Error::Fetch(FetchError::Store(_)) => "store_failed",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::ShuttingDown => "shutting_down",
            Error::QueueFull { .. } => "queue_full",
            Error::WorkerTimeout { .. } => "worker_timeout",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Fetch(FetchError::BudgetExhausted { uri, attempts, .. }) => {
                Some(serde_json::json!({
                    "uri": uri,
                    "attempts": attempts,
                }))
            }
            Error::Fetch(FetchError::Store(StoreError::Write { path, .. })) => {
                Some(serde_json::json!({
                    "path": path,
                }))
            }
            Error::QueueFull { capacity } => Some(serde_json::json!({
                "capacity": capacity,
            })),
            Error::WorkerTimeout { uri, waited_secs } => Some(serde_json::json!({
                "uri": uri,
                "waited_secs": waited_secs,
            })),
            _ => None,
        };

        let mut api_error = ApiError::new(code, message);
        api_error.error.details = details;
        api_error
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn exhausted() -> Error {
        Error::Fetch(FetchError::BudgetExhausted {
            uri: "http://a".into(),
            attempts: 3,
            last_error: TransportError::Timeout {
                uri: "http://a".into(),
            },
        })
    }

    fn write_failure() -> StoreError {
        StoreError::Write {
            path: PathBuf::from("file/x.html"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
    }

    /// (Error, expected_status_code, expected_error_code) for every match arm.
    fn all_error_variants() -> Vec<(Error, u16, &'static str)> {
        vec![
            (
                Error::Config {
                    message: "bad".into(),
                    key: Some("cache.sweep_interval".into()),
                },
                400,
                "config_error",
            ),
            (exhausted(), 502, "fetch_failed"),
            (
                Error::Fetch(FetchError::Store(write_failure())),
                500,
                "store_failed",
            ),
            (
                Error::InvalidRequest("empty uri".into()),
                400,
                "invalid_request",
            ),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                500,
                "io_error",
            ),
            (
                Error::ApiServerError("bind failed".into()),
                500,
                "api_server_error",
            ),
            (Error::ShuttingDown, 503, "shutting_down"),
            (Error::QueueFull { capacity: 10 }, 503, "queue_full"),
            (
                Error::WorkerTimeout {
                    uri: "http://a".into(),
                    waited_secs: 5,
                },
                504,
                "worker_timeout",
            ),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_status_and_code() {
        for (error, expected_status, expected_code) in all_error_variants() {
            assert_eq!(
                error.status_code(),
                expected_status,
                "{expected_code} returned the wrong status"
            );
            assert_eq!(error.error_code(), expected_code);
        }
    }

    #[test]
    fn budget_exhausted_message_names_uri_and_attempts() {
        let message = exhausted().to_string();
        assert!(message.contains("http://a"));
        assert!(message.contains("3 attempt(s)"));
        assert!(message.contains("timed out"));
    }

    #[test]
    fn api_error_from_budget_exhausted_has_uri_and_attempts() {
        let api_error: ApiError = exhausted().into();
        assert_eq!(api_error.error.code, "fetch_failed");
        let details = api_error.error.details.unwrap();
        assert_eq!(details["uri"], "http://a");
        assert_eq!(details["attempts"], 3);
    }

    #[test]
    fn api_error_from_store_failure_has_path() {
        let api_error: ApiError = Error::Fetch(FetchError::Store(write_failure())).into();
        let details = api_error.error.details.unwrap();
        assert!(details["path"].as_str().unwrap().ends_with("x.html"));
    }

    #[test]
    fn api_error_from_shutting_down_has_no_details() {
        let api_error: ApiError = Error::ShuttingDown.into();
        assert!(api_error.error.details.is_none());
        let json = serde_json::to_value(&api_error).unwrap();
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn api_error_new_has_no_details() {
        let api_error = ApiError::new("queue_full", "try later");
        assert_eq!(api_error.error.code, "queue_full");
        assert_eq!(api_error.error.message, "try later");
        assert!(api_error.error.details.is_none());
    }
}
