//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use wiremock::ResponseTemplate;

/// Load an OAI-PMH response fixture.
pub fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("oai")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

/// A 200 response carrying a fixture as XML.
pub fn oai_response(fixture: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/xml; charset=utf-8")
        .set_body_string(load_fixture(fixture))
}

/// Run blocking harvester code off the async test runtime.
pub async fn blocking<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.unwrap()
}
