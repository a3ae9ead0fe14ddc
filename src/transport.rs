//! Network fetch collaborator
//!
//! The fetch core only needs "bytes or a transport error" for a URI. The
//! [`Transport`] trait captures that seam so the orchestration logic can be
//! exercised without a network; [`HttpTransport`] is the production
//! implementation on top of `reqwest`.

use crate::config::FetchConfig;
use crate::error::{Error, Result, TransportError};

/// Abstraction over fetching the body of a remote resource.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the full body of `uri`.
    async fn fetch(&self, uri: &str) -> std::result::Result<Vec<u8>, TransportError>;
}

/// HTTP(S) transport backed by a shared `reqwest::Client`
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client with the configured timeout and user agent.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, uri: &str) -> std::result::Result<Vec<u8>, TransportError> {
        let url = parse_uri(uri)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    uri: uri.to_string(),
                }
            } else {
                TransportError::Request {
                    uri: uri.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                uri: uri.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    uri: uri.to_string(),
                }
            } else {
                TransportError::Body {
                    uri: uri.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        tracing::debug!(uri, bytes = body.len(), "Fetched resource");
        Ok(body.to_vec())
    }
}

/// Only absolute http/https URLs can be fetched.
fn parse_uri(uri: &str) -> std::result::Result<url::Url, TransportError> {
    let url = url::Url::parse(uri).map_err(|e| TransportError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(TransportError::InvalidUri {
            uri: uri.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}
