//! Batch orchestrator.
//!
//! A batch is resolved in rounds. Cached requests succeed up front; the rest are
//! fetched in parallel, one task per request, and their outcomes collected over
//! a bounded channel. Requests that ask for a retry form the next round.
//!
//! Round tasks are detached: dropping a `fetch_batch` future stops collection
//! but every launched fetch still runs to completion and writes its artifact.

use crate::error::Result;
use crate::types::{BatchResult, FetchOutcome, FetchRequest};
use tokio::sync::mpsc;

use super::ArtifactFetcher;
use super::task::{self, OutcomeReporter};

impl ArtifactFetcher {
    /// Resolve a batch of requests.
    ///
    /// Every input request appears exactly once in the result, either as a
    /// descriptor in `succeeded` or as a request in `failed`. Successes are
    /// cached for `cache.batch_ttl` as they arrive. Duplicate URIs are fetched
    /// independently.
    ///
    /// Individual failures never fail the batch; the only error is
    /// [`crate::Error::ShuttingDown`].
    pub async fn fetch_batch(&self, requests: Vec<FetchRequest>) -> Result<BatchResult> {
        self.ensure_accepting()?;

        let total = requests.len();
        let mut result = BatchResult::default();
        let mut pending = Vec::new();

        for request in requests {
            match self.cached_descriptor(&request.uri).await {
                Some(descriptor) => result.succeeded.push(descriptor),
                None => pending.push(self.clamp(request)),
            }
        }
        let cache_hits = result.succeeded.len();

        // Every request loses one unit of budget per round, so no request can
        // legitimately outlive the largest budget in the batch.
        let max_rounds = pending
            .iter()
            .map(|r| r.retry_budget)
            .max()
            .unwrap_or(0)
            .max(1);
        let mut round = 0;

        while !pending.is_empty() {
            if round == max_rounds {
                tracing::error!(
                    rounds = round,
                    remaining = pending.len(),
                    "Batch exceeded its round limit, marking remaining requests failed"
                );
                result.failed.append(&mut pending);
                break;
            }
            round += 1;
            pending = self
                .run_round(round, std::mem::take(&mut pending), &mut result)
                .await;
        }

        debug_assert_eq!(result.len(), total);
        tracing::info!(
            total,
            cache_hits,
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            rounds = round,
            "Batch fetch complete"
        );
        Ok(result)
    }

    /// Launch one task per request and collect exactly that many outcomes.
    ///
    /// Returns the requests to retry in the next round.
    async fn run_round(
        &self,
        round: u32,
        work: Vec<FetchRequest>,
        result: &mut BatchResult,
    ) -> Vec<FetchRequest> {
        let launched = work.len();
        tracing::debug!(round, launched, "Starting batch round");

        let (tx, mut rx) = mpsc::channel(launched.max(1));
        let handles: Vec<_> = work
            .into_iter()
            .map(|request| {
                let reporter = OutcomeReporter::new(tx.clone(), request.clone());
                tokio::spawn(task::run_fetch_task(
                    self.backend.clone(),
                    request,
                    reporter,
                ))
            })
            .collect();
        drop(tx);

        let mut retry = Vec::new();
        let mut received = 0;
        while received < launched {
            let Some(outcome) = rx.recv().await else {
                tracing::error!(
                    round,
                    received,
                    launched,
                    "Outcome channel closed before every task reported"
                );
                break;
            };
            received += 1;

            match outcome {
                FetchOutcome::Success(descriptor) => {
                    self.cache
                        .update(
                            &descriptor.source_uri,
                            descriptor.artifact_id.clone(),
                            self.config.cache.batch_ttl,
                        )
                        .await;
                    result.succeeded.push(descriptor);
                }
                FetchOutcome::Retry(request) => retry.push(request),
                FetchOutcome::Failed(request) => result.failed.push(request),
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(round, error = %e, "Fetch task did not complete cleanly");
            }
        }

        retry
    }
}
