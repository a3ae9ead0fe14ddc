//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the artifact-fetcher REST
//! API using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the artifact-fetcher REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (backed by `/api-docs/openapi.json`)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "artifact-fetcher REST API",
        version = "0.1.0",
        description = "Fetch remote resources, persist them as local artifacts, and serve repeats from a time-bounded cache",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:9090", description = "Local development server")
    ),
    paths(
        // Fetching
        crate::api::routes::fetch_one,
        crate::api::routes::fetch_all,
        crate::api::routes::fetch_worker,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::ArtifactId,
        crate::types::FetchRequest,
        crate::types::ArtifactDescriptor,
        crate::types::BatchRequest,
        crate::types::BatchResult,
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "fetch", description = "Artifact fetching - Single, batch, and worker-queued fetches"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
