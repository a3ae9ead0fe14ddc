use super::*;
use crate::fetcher::test_helpers::{ScriptedTransport, create_test_fetcher};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a test ArtifactFetcher instance wrapped in Arc
async fn create_test_app(
    transport: Arc<ScriptedTransport>,
) -> (Router, Arc<ArtifactFetcher>, tempfile::TempDir) {
    let (fetcher, temp_dir) = create_test_fetcher(transport).await;
    let config = Arc::new(fetcher.config().clone());
    let fetcher = Arc::new(fetcher);
    (create_router(fetcher.clone(), config), fetcher, temp_dir)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns_and_stops_on_shutdown_signal() {
    let (fetcher, _temp_dir) = create_test_fetcher(Arc::new(ScriptedTransport::always_ok())).await;

    let mut config = fetcher.config().clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let api_handle = tokio::spawn(start_api_server_with_shutdown(
        Arc::new(fetcher),
        config,
        async move {
            let _ = stop_rx.await;
        },
    ));

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (fetcher, _temp_dir) = create_test_fetcher(Arc::new(ScriptedTransport::always_ok())).await;

    let mut config = fetcher.config().clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(Arc::new(fetcher), Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (fetcher, _temp_dir) = create_test_fetcher(Arc::new(ScriptedTransport::always_ok())).await;

    let mut config = fetcher.config().clone();
    config.server.api.cors_enabled = false;
    let app = create_router(Arc::new(fetcher), Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[test]
fn test_build_cors_layer_with_specific_origins() {
    // Unparseable origins are skipped rather than rejected
    let _layer = build_cors_layer(&[
        "http://localhost:3000".to_string(),
        "not a header\nvalue".to_string(),
    ]);
}
