//! Background worker pool behind queued fetches.
//!
//! Requests are pushed onto a bounded queue and picked up by a fixed number of
//! workers. The caller waits on a oneshot channel for the worker's result,
//! bounded by `worker.wait_timeout`.

use crate::config::WorkerPoolConfig;
use crate::error::{Error, FetchError, Result};
use crate::types::{ArtifactDescriptor, ArtifactId, FetchRequest};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{ArtifactFetcher, FetchBackend, single};

type JobResult = std::result::Result<PathBuf, FetchError>;

/// Unit of work handed to a worker
pub(crate) struct WorkerJob {
    pub(crate) request: FetchRequest,
    pub(crate) artifact_id: ArtifactId,
    pub(crate) respond_to: oneshot::Sender<JobResult>,
}

pub(crate) struct WorkerPool {
    tx: mpsc::Sender<WorkerJob>,
    capacity: usize,
    stop: CancellationToken,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Start `config.workers` workers sharing one queue.
    pub(crate) fn spawn(config: &WorkerPoolConfig, backend: FetchBackend) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let queue = Arc::new(Mutex::new(rx));
        let stop = CancellationToken::new();

        let handles = (0..config.workers)
            .map(|worker_id| spawn_worker(worker_id, queue.clone(), backend.clone(), stop.clone()))
            .collect();

        Self {
            tx,
            capacity: config.queue_capacity,
            stop,
            handles: Mutex::new(handles),
        }
    }

    /// Enqueue without waiting for space.
    pub(crate) fn submit(&self, job: WorkerJob) -> Result<()> {
        if self.stop.is_cancelled() {
            return Err(Error::ShuttingDown);
        }
        self.tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => Error::QueueFull {
                capacity: self.capacity,
            },
            TrySendError::Closed(_) => Error::ShuttingDown,
        })
    }

    /// Stop taking jobs and wait for every worker to exit.
    ///
    /// A job already being fetched runs to completion; jobs still queued are
    /// dropped and their callers see [`Error::ShuttingDown`].
    pub(crate) async fn shutdown(&self) {
        self.stop.cancel();

        let handles = std::mem::take(&mut *self.handles.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Fetch worker ended abnormally");
            }
        }
    }
}

fn spawn_worker(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<WorkerJob>>>,
    backend: FetchBackend,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!(worker_id, "Fetch worker started");

        loop {
            let job = tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                job = async { queue.lock().await.recv().await } => job,
            };
            let Some(job) = job else { break };

            let result = single::fetch_and_store(&backend, &job.request, &job.artifact_id).await;
            if job.respond_to.send(result).is_err() {
                tracing::debug!(
                    worker_id,
                    uri = %job.request.uri,
                    "Caller stopped waiting before the fetch finished"
                );
            }
        }

        tracing::debug!(worker_id, "Fetch worker stopped");
    })
}

impl ArtifactFetcher {
    /// Resolve one request through the worker pool.
    ///
    /// Same contract as [`ArtifactFetcher::fetch_one`] (including the single TTL)
    /// but the fetch runs on a pool worker. The queue is bounded; a full queue is
    /// rejected immediately rather than waiting for space.
    ///
    /// # Errors
    ///
    /// - [`Error::QueueFull`] when the queue has no room
    /// - [`Error::WorkerTimeout`] when no result arrives within `worker.wait_timeout`
    ///   (the worker may still complete the fetch, but the cache is not updated)
    /// - [`Error::ShuttingDown`] when the pool stopped before the job ran
    /// - [`FetchError`] variants as for `fetch_one`
    pub async fn fetch_queued(&self, request: FetchRequest) -> Result<ArtifactDescriptor> {
        self.ensure_accepting()?;

        if let Some(descriptor) = self.cached_descriptor(&request.uri).await {
            tracing::debug!(uri = %request.uri, artifact_id = %descriptor.artifact_id, "Cache hit");
            return Ok(descriptor);
        }

        let request = self.clamp(request);
        let artifact_id = self.backend.ids.generate();
        let (respond_to, response) = oneshot::channel();

        self.workers.submit(WorkerJob {
            request: request.clone(),
            artifact_id: artifact_id.clone(),
            respond_to,
        })?;

        let wait = self.config.worker.wait_timeout;
        let path = match tokio::time::timeout(wait, response).await {
            Ok(Ok(result)) => result?,
            Ok(Err(_)) => return Err(Error::ShuttingDown),
            Err(_) => {
                tracing::warn!(uri = %request.uri, waited_secs = wait.as_secs(), "Queued fetch timed out");
                return Err(Error::WorkerTimeout {
                    uri: request.uri,
                    waited_secs: wait.as_secs(),
                });
            }
        };

        self.cache
            .update(
                &request.uri,
                artifact_id.clone(),
                self.config.cache.single_ttl,
            )
            .await;

        tracing::info!(uri = %request.uri, artifact_id = %artifact_id, "Artifact fetched by worker");
        Ok(self.backend.descriptor(artifact_id, &request.uri, &path))
    }
}
