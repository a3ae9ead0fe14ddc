use super::test_helpers::{
    FailingStore, ScriptedTransport, SequentialIds, create_test_fetcher, create_test_fetcher_with,
    test_config,
};
use super::*;
use crate::types::BatchResult;
use std::time::Duration;


/// Fetcher whose store rejects every write.
fn fetcher_with_failing_store(
    transport: Arc<ScriptedTransport>,
) -> (ArtifactFetcher, tempfile::TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let backend = FetchBackend {
        transport,
        store: Arc::new(FailingStore),
        ids: Arc::new(SequentialIds::default()),
    };
    let fetcher = ArtifactFetcher::with_backend(test_config(temp_dir.path()), backend).unwrap();
    (fetcher, temp_dir)
}

fn succeeded_uris(result: &BatchResult) -> Vec<&str> {
    let mut uris: Vec<&str> = result
        .succeeded
        .iter()
        .map(|d| d.source_uri.as_str())
        .collect();
    uris.sort_unstable();
    uris
}
