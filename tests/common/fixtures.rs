//! HTTP fixtures served by wiremock

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Serve `body` with 200 at `route`.
pub async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Answer `route` with `status` on every request.
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Responds 503 for the first `failures` requests, then 200 with `body`.
pub struct FlakyResponder {
    failures: u32,
    body: String,
    seen: Arc<AtomicU32>,
}

impl Respond for FlakyResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.seen.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failures {
            ResponseTemplate::new(503)
        } else {
            ResponseTemplate::new(200).set_body_string(self.body.clone())
        }
    }
}

/// Mount a route that fails `failures` times before succeeding.
///
/// Returns the shared request counter.
pub async fn mount_flaky(
    server: &MockServer,
    route: &str,
    failures: u32,
    body: &str,
) -> Arc<AtomicU32> {
    let seen = Arc::new(AtomicU32::new(0));
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(FlakyResponder {
            failures,
            body: body.to_string(),
            seen: seen.clone(),
        })
        .mount(server)
        .await;
    seen
}
