//! Per-item fetch task used by batch rounds.
//!
//! Each task makes exactly one attempt for its request and reports exactly one
//! [`FetchOutcome`] back to the round that launched it.

use crate::retry::IsRetryable;
use crate::types::{FetchOutcome, FetchRequest};
use tokio::sync::mpsc;

use super::FetchBackend;

/// Sends the task's outcome to the collector.
///
/// If the task ends without reporting (it panicked or was aborted) the drop
/// guard marks the launched request failed, so the collector always
/// receives one outcome per launched task.
pub(super) struct OutcomeReporter {
    tx: mpsc::Sender<FetchOutcome>,
    fallback: Option<FetchRequest>,
}

impl OutcomeReporter {
    pub(super) fn new(tx: mpsc::Sender<FetchOutcome>, request: FetchRequest) -> Self {
        Self {
            tx,
            fallback: Some(request),
        }
    }

    async fn report(mut self, outcome: FetchOutcome) {
        self.fallback = None;
        if self.tx.send(outcome).await.is_err() {
            tracing::warn!("Batch collector went away before outcome was reported");
        }
    }
}

impl Drop for OutcomeReporter {
    fn drop(&mut self) {
        if let Some(request) = self.fallback.take() {
            tracing::error!(uri = %request.uri, "Fetch task ended without reporting, marking failed");
            // Channel capacity equals the number of tasks, so this cannot be full
            let _ = self.tx.try_send(FetchOutcome::Failed(request));
        }
    }
}

/// One attempt for `request`.
///
/// - fetched and stored: `Success`
/// - transport error, budget left after this attempt: `Retry` with the
///   decremented budget
/// - transport error, no budget left or not retryable: `Failed`
/// - stored write failed: `Failed`
pub(super) async fn run_fetch_task(
    backend: FetchBackend,
    mut request: FetchRequest,
    reporter: OutcomeReporter,
) {
    request.consume_attempt();

    let outcome = match backend.transport.fetch(&request.uri).await {
        Ok(body) => {
            let artifact_id = backend.ids.generate();
            match backend.store.store(&artifact_id, &body).await {
                Ok(path) => {
                    FetchOutcome::Success(backend.descriptor(artifact_id, &request.uri, &path))
                }
                Err(e) => {
                    tracing::error!(uri = %request.uri, error = %e, "Failed to store artifact");
                    FetchOutcome::Failed(request)
                }
            }
        }
        Err(e) if e.is_retryable() && request.retry_budget > 0 => {
            tracing::warn!(
                uri = %request.uri,
                error = %e,
                remaining = request.retry_budget,
                "Fetch attempt failed, will retry next round"
            );
            FetchOutcome::Retry(request)
        }
        Err(e) => {
            tracing::error!(uri = %request.uri, error = %e, "Fetch failed");
            FetchOutcome::Failed(request)
        }
    };

    reporter.report(outcome).await;
}
