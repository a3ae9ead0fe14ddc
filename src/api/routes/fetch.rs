//! Artifact fetch handlers.

use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::{ArtifactDescriptor, BatchRequest, BatchResult, FetchRequest};
use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};

/// POST /fetch - Fetch one resource (or return the cached artifact)
#[utoipa::path(
    post,
    path = "/fetch",
    tag = "fetch",
    request_body = FetchRequest,
    responses(
        (status = 201, description = "Artifact fetched or served from cache", body = ArtifactDescriptor),
        (status = 400, description = "Malformed request", body = crate::error::ApiError),
        (status = 500, description = "Artifact could not be stored", body = crate::error::ApiError),
        (status = 502, description = "Resource could not be fetched within the retry budget", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn fetch_one(
    State(state): State<AppState>,
    payload: std::result::Result<Json<FetchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ArtifactDescriptor>)> {
    let Json(request) = payload?;
    validate_uri(&request)?;

    let descriptor = state.fetcher.fetch_one(request).await?;
    Ok((StatusCode::CREATED, Json(descriptor)))
}

/// POST /fetchAll - Fetch a batch of resources
///
/// Always answers with the partitioned result; individual failures are listed
/// in `failed` with their remaining budget.
#[utoipa::path(
    post,
    path = "/fetchAll",
    tag = "fetch",
    request_body = BatchRequest,
    responses(
        (status = 201, description = "Batch resolved; blank URIs are listed as failed", body = BatchResult),
        (status = 400, description = "Malformed JSON body", body = crate::error::ApiError),
        (status = 503, description = "Shutting down", body = crate::error::ApiError)
    )
)]
pub async fn fetch_all(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BatchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BatchResult>)> {
    let Json(batch) = payload?;

    // A blank URI fails on its own; it never rejects the rest of the batch
    let (blank, requests): (Vec<_>, Vec<_>) = batch
        .urls
        .into_iter()
        .partition(is_blank);

    let mut result = state.fetcher.fetch_batch(requests).await?;
    if !blank.is_empty() {
        tracing::debug!(count = blank.len(), "Blank URIs reported as failed");
        result.failed.extend(blank);
    }
    Ok((StatusCode::CREATED, Json(result)))
}

/// POST /fetchWorker - Fetch one resource through the worker pool
#[utoipa::path(
    post,
    path = "/fetchWorker",
    tag = "fetch",
    request_body = FetchRequest,
    responses(
        (status = 201, description = "Artifact fetched or served from cache", body = ArtifactDescriptor),
        (status = 400, description = "Malformed request", body = crate::error::ApiError),
        (status = 502, description = "Resource could not be fetched within the retry budget", body = crate::error::ApiError),
        (status = 503, description = "Worker queue full or shutting down", body = crate::error::ApiError),
        (status = 504, description = "No result within the wait timeout", body = crate::error::ApiError)
    )
)]
pub async fn fetch_worker(
    State(state): State<AppState>,
    payload: std::result::Result<Json<FetchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ArtifactDescriptor>)> {
    let Json(request) = payload?;
    validate_uri(&request)?;

    let descriptor = state.fetcher.fetch_queued(request).await?;
    Ok((StatusCode::CREATED, Json(descriptor)))
}

fn is_blank(request: &FetchRequest) -> bool {
    request.uri.trim().is_empty()
}

fn validate_uri(request: &FetchRequest) -> Result<()> {
    if is_blank(request) {
        return Err(Error::InvalidRequest("uri must not be empty".to_string()));
    }
    Ok(())
}
