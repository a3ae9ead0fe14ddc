//! Application state for the API server

use crate::ArtifactFetcher;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone). Handlers read configuration
/// through [`ArtifactFetcher::config`].
#[derive(Clone)]
pub struct AppState {
    /// The main ArtifactFetcher instance
    pub fetcher: Arc<ArtifactFetcher>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(fetcher: Arc<ArtifactFetcher>) -> Self {
        Self { fetcher }
    }
}
